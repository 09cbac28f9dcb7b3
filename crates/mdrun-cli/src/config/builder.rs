use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::RunArgs;
use crate::data::DataManager;
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use mdrun::core::forcefield::library::ForceFieldId;
use mdrun::engine::config::{ConfigError, MinimizationOptions};
use mdrun::workflows::run::SimulationConfigBuilder;
use std::path::PathBuf;
use tracing::debug;

pub fn build_config(args: &RunArgs, data_manager: &DataManager) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let file = apply_set_values(file_config, &args.set_values)?;
    debug!("Effective file configuration: {:?}", &file);

    let force_fields: Vec<ForceFieldId> = if !args.force_fields.is_empty() {
        args.force_fields.iter().map(ForceFieldId::new).collect()
    } else {
        file.force_fields
            .unwrap_or_default()
            .into_iter()
            .map(ForceFieldId::from)
            .collect()
    };

    let mut builder = SimulationConfigBuilder::new()
        .force_fields(force_fields)
        .checkpoint_path(
            args.checkpoint
                .clone()
                .or(file.checkpoint)
                .unwrap_or(defaults.checkpoint),
        )
        .output_path(
            args.output
                .clone()
                .or(file.output)
                .unwrap_or(defaults.output),
        )
        .constraints(
            args.constraints
                .or(file.constraints)
                .unwrap_or(defaults.constraints),
        )
        .minimization(MinimizationOptions {
            tolerance: args
                .minimize_tolerance
                .or(file.minimize_tolerance)
                .unwrap_or(defaults.minimize_tolerance),
            max_iterations: args
                .minimize_max_iterations
                .or(file.minimize_max_iterations)
                .unwrap_or(defaults.minimize_max_iterations),
        });

    if let Some(input) = args.input.clone().or(file.input) {
        builder = builder.input_structure(input);
    }
    if let Some(method) = args.nonbonded_method.or(file.nonbonded_method) {
        builder = builder.nonbonded_method(method);
    }
    if let Some(cutoff) = args.nonbonded_cutoff.or(file.nonbonded_cutoff) {
        builder = builder.nonbonded_cutoff(cutoff);
    }
    if let Some(temperature) = args.temperature.or(file.temperature) {
        builder = builder.temperature(temperature);
    }
    if let Some(friction) = args.friction.or(file.friction) {
        builder = builder.friction(friction);
    }
    if let Some(step_size) = args.step_size.or(file.step_size) {
        builder = builder.step_size(step_size);
    }
    if let Some(seed) = args.seed.or(file.seed) {
        builder = builder.seed(seed);
    }
    if let Some(steps) = args.checkpoint_steps.or(file.checkpoint_steps) {
        builder = builder.checkpoint_interval(steps);
    }
    if let Some(steps) = args.total_steps.or(file.total_steps) {
        builder = builder.total_steps(steps);
    }

    let simulation = builder.build().map_err(config_error)?;
    let data_dir = args.data_dir.clone().or(file.data_dir);
    let library = data_manager.library(data_dir.as_deref());

    Ok(AppConfig {
        simulation,
        library,
    })
}

/// Names missing parameters by their command-line flag.
fn config_error(error: ConfigError) -> CliError {
    match error {
        ConfigError::MissingParameter(name) => CliError::Config(format!(
            "Missing required parameter '{}'. Provide --{} or set it in the config file.",
            name,
            flag_name(name)
        )),
        other => CliError::Config(other.to_string()),
    }
}

fn flag_name(parameter: &str) -> String {
    match parameter {
        "input_structure" => "input".to_string(),
        "checkpoint_interval" => "checkpoint-steps".to_string(),
        other => other.replace('_', "-"),
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    for kv_pair in set_values {
        apply_set_value(&mut config, kv_pair)
            .map_err(|e| CliError::Config(e.to_string()))?;
    }
    Ok(config)
}

fn apply_set_value(config: &mut FileConfig, kv_pair: &str) -> std::result::Result<(), ParseError> {
    let (key, value) = parser::parse_key_value(kv_pair)?;

    match key {
        "input" => config.input = Some(PathBuf::from(value)),
        "force-fields" => config.force_fields = Some(parser::parse_list(value)),
        "data-dir" => config.data_dir = Some(PathBuf::from(value)),
        "checkpoint" => config.checkpoint = Some(PathBuf::from(value)),
        "output" => config.output = Some(PathBuf::from(value)),
        "nonbonded-method" => config.nonbonded_method = Some(parser::parse_value(key, value)?),
        "nonbonded-cutoff" => config.nonbonded_cutoff = Some(parser::parse_value(key, value)?),
        "constraints" => config.constraints = Some(parser::parse_value(key, value)?),
        "temperature" => config.temperature = Some(parser::parse_value(key, value)?),
        "friction" => config.friction = Some(parser::parse_value(key, value)?),
        "step-size" => config.step_size = Some(parser::parse_value(key, value)?),
        "seed" => config.seed = Some(parser::parse_value(key, value)?),
        "checkpoint-steps" => config.checkpoint_steps = Some(parser::parse_value(key, value)?),
        "total-steps" => config.total_steps = Some(parser::parse_value(key, value)?),
        "minimize-tolerance" => {
            config.minimize_tolerance = Some(parser::parse_value(key, value)?)
        }
        "minimize-max-iterations" => {
            config.minimize_max_iterations = Some(parser::parse_value(key, value)?)
        }
        _ => {
            return Err(ParseError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                reason: "unsupported configuration key".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdrun::engine::config::{Constraints, NonbondedMethod};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn complete_args() -> RunArgs {
        RunArgs {
            input: Some(PathBuf::from("input.pdb")),
            force_fields: vec!["amber14-all".to_string()],
            nonbonded_cutoff: Some(1.0),
            temperature: Some(300.0),
            friction: Some(1.0),
            step_size: Some(0.002),
            checkpoint_steps: Some(10_000),
            total_steps: Some(1_000_000),
            ..Default::default()
        }
    }

    fn manager() -> DataManager {
        DataManager::with_custom_path(PathBuf::from("/data/mdrun"))
    }

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("run.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn cli_only_configuration_uses_defaults_for_optional_settings() {
        let app = build_config(&complete_args(), &manager()).expect("build ok");
        let cfg = app.simulation;

        assert_eq!(cfg.input_structure, PathBuf::from("input.pdb"));
        assert_eq!(cfg.force_fields, vec![ForceFieldId::new("amber14-all")]);
        assert_eq!(cfg.checkpoint_interval.get(), 10_000);
        assert_eq!(cfg.total_steps, 1_000_000);
        assert_eq!(cfg.checkpoint_path, DefaultsConfig::default().checkpoint);
        assert_eq!(cfg.output_path, DefaultsConfig::default().output);
        assert_eq!(cfg.nonbonded.constraints, Constraints::HBonds);
        assert_eq!(cfg.nonbonded.method, None);
        assert_eq!(cfg.minimization, MinimizationOptions::default());
        assert_eq!(app.library.search_dirs(), &[PathBuf::from("/data/mdrun")]);
    }

    #[test]
    fn file_supplies_everything_the_cli_omits() {
        let dir = tempdir().unwrap();
        let cfg_path = write_config(
            dir.path(),
            r#"
            input = "input.pdb"
            force-fields = ["amber14-all", "amber14/tip3pfb"]
            nonbonded-method = "cutoff-non-periodic"
            nonbonded-cutoff = 0.9
            temperature = 310.0
            friction = 2.0
            step-size = 0.001
            checkpoint-steps = 500
            total-steps = 5000
            checkpoint = "runs/state.chk"
            output = "runs/final.pdb"
            data-dir = "/shared/forcefields"
            "#,
        );
        let args = RunArgs {
            config: Some(cfg_path),
            ..Default::default()
        };

        let app = build_config(&args, &manager()).expect("build ok");
        let cfg = app.simulation;

        assert_eq!(cfg.force_fields.len(), 2);
        assert_eq!(
            cfg.nonbonded.method,
            Some(NonbondedMethod::CutoffNonPeriodic)
        );
        assert_eq!(cfg.nonbonded.cutoff.value(), 0.9);
        assert_eq!(cfg.integrator.temperature.value(), 310.0);
        assert_eq!(cfg.integrator.step_size.value(), 0.001);
        assert_eq!(cfg.checkpoint_path, PathBuf::from("runs/state.chk"));
        assert_eq!(cfg.output_path, PathBuf::from("runs/final.pdb"));
        assert_eq!(
            app.library.search_dirs(),
            &[
                PathBuf::from("/shared/forcefields"),
                PathBuf::from("/data/mdrun")
            ]
        );
    }

    #[test]
    fn cli_overrides_set_values_which_override_the_file() {
        let dir = tempdir().unwrap();
        let cfg_path = write_config(
            dir.path(),
            r#"
            temperature = 280.0
            friction = 5.0
            total-steps = 100
            "#,
        );
        let mut args = complete_args();
        args.config = Some(cfg_path);
        args.temperature = Some(320.0);
        args.friction = None;
        args.total_steps = None;
        args.set_values = vec!["friction=0.5".to_string(), "temperature=1.0".to_string()];

        let cfg = build_config(&args, &manager()).expect("build ok").simulation;

        assert_eq!(cfg.integrator.temperature.value(), 320.0);
        assert_eq!(cfg.integrator.friction.value(), 0.5);
        assert_eq!(cfg.total_steps, 100);
    }

    #[test]
    fn missing_required_parameter_names_the_flag() {
        let mut args = complete_args();
        args.checkpoint_steps = None;

        let err = build_config(&args, &manager()).err().expect("must fail");
        let message = err.to_string();
        assert!(matches!(err, CliError::Config(_)));
        assert!(message.contains("--checkpoint-steps"), "{}", message);
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let mut args = complete_args();
        args.step_size = Some(0.0);
        assert!(matches!(
            build_config(&args, &manager()),
            Err(CliError::Config(_))
        ));

        let mut args = complete_args();
        args.checkpoint_steps = Some(0);
        assert!(matches!(
            build_config(&args, &manager()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn set_values_cover_every_file_key() {
        let config = apply_set_values(
            FileConfig::default(),
            &[
                "input=a.pdb".to_string(),
                "force-fields=ff1,ff2".to_string(),
                "data-dir=/ff".to_string(),
                "checkpoint=c.chk".to_string(),
                "output=o.pdb".to_string(),
                "nonbonded-method=no-cutoff".to_string(),
                "nonbonded-cutoff=1.2".to_string(),
                "constraints=none".to_string(),
                "temperature=300".to_string(),
                "friction=1".to_string(),
                "step-size=0.002".to_string(),
                "seed=42".to_string(),
                "checkpoint-steps=10".to_string(),
                "total-steps=100".to_string(),
                "minimize-tolerance=5.0".to_string(),
                "minimize-max-iterations=50".to_string(),
            ],
        )
        .unwrap();

        assert_eq!(config.input, Some(PathBuf::from("a.pdb")));
        assert_eq!(
            config.force_fields,
            Some(vec!["ff1".to_string(), "ff2".to_string()])
        );
        assert_eq!(config.nonbonded_method, Some(NonbondedMethod::NoCutoff));
        assert_eq!(config.constraints, Some(Constraints::None));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.minimize_max_iterations, Some(50));
    }

    #[test]
    fn unsupported_or_malformed_set_values_are_rejected() {
        for bad in ["temprature=300", "seed", "total-steps=many"] {
            let result = apply_set_values(FileConfig::default(), &[bad.to_string()]);
            assert!(matches!(result, Err(CliError::Config(_))), "{}", bad);
        }
    }
}
