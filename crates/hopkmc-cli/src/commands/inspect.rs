use super::load_material;
use crate::cli::InspectArgs;
use crate::config::{GeometryConfig, build_geometry_config};
use crate::error::Result;
use hopkmc::core::models::lattice::LatticeModel;
use hopkmc::core::models::material::Material;
use hopkmc::core::neighbors::index::NeighborIndex;
use hopkmc::core::physics::potentials::{marcus_activation, marcus_rate};
use hopkmc::engine::error::EngineError;
use hopkmc::engine::process::ProcessCatalog;
use tracing::info;

pub async fn run(args: InspectArgs) -> Result<()> {
    let material = load_material(&args.material)?;
    let geometry = build_geometry_config(&args)?;

    info!("Building lattice and neighbor shells for inspection...");
    let summary = tokio::task::block_in_place(|| summarize(&material, &geometry))?;
    println!("{}", summary);
    Ok(())
}

fn summarize(material: &Material, geometry: &GeometryConfig) -> Result<String> {
    let lattice = LatticeModel::new(material, geometry.system_size, geometry.periodicity)
        .map_err(EngineError::from)?;
    let neighbors = NeighborIndex::build(
        &lattice,
        &material.neighbors,
        &material.element_type_delimiter,
    )
    .map_err(EngineError::from)?;
    let catalog = ProcessCatalog::build(material, &lattice, &neighbors).map_err(EngineError::from)?;

    let [nx, ny, nz] = lattice.size();
    let [px, py, pz] = lattice.periodicity().0;
    let mut lines = vec![
        format!("Material: {}", material.name),
        format!("Supercell: {nx} x {ny} x {nz} (periodic x={px} y={py} z={pz})"),
        format!(
            "Sites: {} in {} cells ({} per cell)",
            lattice.total_sites(),
            lattice.num_cells(),
            lattice.elements_per_cell()
        ),
    ];
    for element_type in lattice.element_types() {
        lines.push(format!(
            "  {:<8} {:>8} sites  base charge {:+.3}",
            element_type.name,
            lattice.sites_of_type(element_type.index).count(),
            element_type.base_charge
        ));
    }

    lines.push("Neighbor shells:".to_string());
    for (key, shells) in neighbors.iter() {
        for (k, shell) in shells.iter().enumerate() {
            lines.push(format!(
                "  {:<8} #{}  cutoff {:>8.3} Å  centers {:>6}  pairs {:>8}",
                key,
                k,
                shell.cutoff(),
                shell.centers().len(),
                shell.total_pairs()
            ));
        }
    }

    let attempt_frequency = material.hopping.attempt_frequency;
    lines.push(format!(
        "Rate classes at {:.1} K (vn = {:.3e} 1/s):",
        geometry.temperature, attempt_frequency
    ));
    for class in catalog.classes() {
        let rate = marcus_rate(
            attempt_frequency,
            marcus_activation(class.lambda, 0.0, None),
            geometry.temperature,
        );
        lines.push(format!(
            "  {:<8} {:<16} lambda {:.4} eV  vab {:.4} eV  rate {:.3e} 1/s",
            class.channel, class.name, class.lambda, class.vab, rate
        ));
    }
    Ok(lines.join("\n"))
}
