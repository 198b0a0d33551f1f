/// Values used when neither the config file nor the command line sets a parameter.
pub struct DefaultsConfig {
    pub timestep_fs: f64,
    pub frame_interval: usize,
    pub n_steps: usize,
    pub seed: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            timestep_fs: 1.0,
            frame_interval: 10,
            n_steps: 1000,
            seed: 0,
        }
    }
}
