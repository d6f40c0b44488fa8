pub struct DefaultsConfig {
    pub temperature: f64,
    pub periodic: bool,
    pub n_traj: usize,
    pub kmc_steps: usize,
    pub step_interval: usize,
    pub random_seed: u64,
    pub coupling_correction: bool,
    pub time_scale: f64,
    pub distance_scale: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            temperature: 300.0,
            periodic: false,
            n_traj: 1,
            kmc_steps: 10_000,
            step_interval: 100,
            random_seed: 0,
            coupling_correction: false,
            time_scale: 1.0,
            distance_scale: 1.0,
        }
    }
}
