use mdrun::core::forcefield::library::ForcefieldLibrary;
use mdrun::workflows::run::SimulationConfig;

pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub library: ForcefieldLibrary,
}
