/// XDental command-line entry point for native builds
#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    match cli::run(std::env::args().skip(1).collect()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(cli::CliError::Usage(message)) => {
            eprintln!("{}\n\n{}", message, cli::USAGE);
            std::process::ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use serde_json::{Value, json};

    use xdental::config::{AppConfig, ConfigError};
    use xdental::gate::RequestGate;
    use xdental::geometry::normalize_value;
    use xdental::model::tooth_name;
    use xdental::state::{DentalStore, LayoutKey, LayoutStore};
    use xdental::store::FileStorage;

    pub const USAGE: &str = "\
Usage: xdental [--config <file>] <command>

Commands:
  normalize <file.json>        Normalize a finding or an array of findings
  gate <path> [cookie-header]  Show the request gate decision for a path
  layouts [KEY]                List layouts, optionally selecting KEY
  report [file.json]           Load a patient report, or show the stored one
  tooth <number>               Name of a tooth in FDI notation";

    #[derive(Debug, thiserror::Error)]
    pub enum CliError {
        #[error("{0}")]
        Usage(String),

        #[error("Failed to read {path:?}: {source}")]
        Read {
            path: PathBuf,
            source: std::io::Error,
        },

        #[error("Invalid JSON: {0}")]
        Json(#[from] serde_json::Error),

        #[error(transparent)]
        Config(#[from] ConfigError),

        #[error("No state directory available")]
        NoStateDirectory,

        #[error(transparent)]
        Store(#[from] xdental::StoreError),
    }

    fn usage(message: impl Into<String>) -> CliError {
        CliError::Usage(message.into())
    }

    pub fn run(args: Vec<String>) -> Result<(), CliError> {
        let mut args = args.into_iter();
        let mut config_path = None;
        let mut command = None;

        for arg in args.by_ref() {
            match arg.as_str() {
                "--config" => config_path = Some(None),
                "-h" | "--help" => {
                    println!("{}", USAGE);
                    return Ok(());
                }
                _ if matches!(config_path, Some(None)) => config_path = Some(Some(arg)),
                _ => {
                    command = Some(arg);
                    break;
                }
            }
        }
        let rest: Vec<String> = args.collect();

        let config = match config_path {
            Some(Some(path)) => AppConfig::load(std::path::Path::new(&path))?,
            Some(None) => return Err(usage("--config needs a file")),
            None => AppConfig::load_from_default_path().unwrap_or_default(),
        };

        env_logger::Builder::new()
            .filter_level(config.preferences.log_level.to_level_filter())
            .parse_default_env()
            .init();

        let command = command.ok_or_else(|| usage("Missing command"))?;
        log::debug!("Running '{}' with {:?}", command, rest);

        let output = match command.as_str() {
            "normalize" => normalize(&rest)?,
            "gate" => gate(&config, &rest)?,
            "layouts" => layouts(&config, &rest)?,
            "report" => report(&config, &rest)?,
            "tooth" => tooth(&rest)?,
            other => return Err(usage(format!("Unknown command '{}'", other))),
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn read_json(path: &std::path::Path) -> Result<Value, CliError> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn state_storage(config: &AppConfig) -> Result<FileStorage, CliError> {
        config
            .storage
            .directory
            .clone()
            .or_else(FileStorage::default_directory)
            .map(FileStorage::new)
            .ok_or(CliError::NoStateDirectory)
    }

    fn normalize(args: &[String]) -> Result<Value, CliError> {
        let path = PathBuf::from(args.first().ok_or_else(|| usage("normalize needs a file"))?);
        let value = read_json(&path)?;

        let output = match &value {
            Value::Array(findings) => {
                let boxes: Vec<_> = findings.iter().map(normalize_value).collect();
                log::info!(
                    "Normalized {} of {} findings",
                    boxes.iter().flatten().count(),
                    boxes.len()
                );
                serde_json::to_value(boxes)?
            }
            finding => serde_json::to_value(normalize_value(finding))?,
        };
        Ok(output)
    }

    fn gate(config: &AppConfig, args: &[String]) -> Result<Value, CliError> {
        let path = args.first().ok_or_else(|| usage("gate needs a path"))?;
        let cookie = args.get(1).map(String::as_str);
        let decision = RequestGate::new(config.gate.clone()).evaluate_now(path, cookie);
        Ok(serde_json::to_value(decision)?)
    }

    fn layouts(config: &AppConfig, args: &[String]) -> Result<Value, CliError> {
        let mut store =
            LayoutStore::persistent(Box::new(state_storage(config)?), config.layout.default_layout);

        if let Some(key) = args.first() {
            if !store.set_layout(key) {
                return Err(usage(format!("Unknown layout '{}'", key)));
            }
            log::info!("Selected layout {}", key);
        }

        let current = store.current();
        let entries: Vec<Value> = LayoutKey::all()
            .iter()
            .map(|key| {
                let template = key.template();
                json!({
                    "key": key.as_str(),
                    "name": template.name,
                    "description": template.description,
                    "columns": template.columns,
                    "rows": template.rows,
                    "template": template.template,
                    "current": *key == current,
                })
            })
            .collect();
        Ok(Value::Array(entries))
    }

    fn report(config: &AppConfig, args: &[String]) -> Result<Value, CliError> {
        let mut store = DentalStore::open_with_history(state_storage(config)?, config.history);

        if let Some(file) = args.first() {
            store.load_report_value(read_json(std::path::Path::new(file))?)?;
        }

        let state = store.state();
        Ok(json!({
            "patientId": state.data.patient_info.patient_id,
            "status": state.data_status(),
            "validation": state.validate(),
            "problems": state.problem_statistics(),
            "history": state.history.len(),
        }))
    }

    fn tooth(args: &[String]) -> Result<Value, CliError> {
        let raw = args.first().ok_or_else(|| usage("tooth needs a number"))?;
        let number: u32 = raw
            .parse()
            .map_err(|_| usage(format!("'{}' is not a tooth number", raw)))?;
        let name = tooth_name(number)
            .ok_or_else(|| usage(format!("{} is not an FDI tooth number", number)))?;
        Ok(json!({ "number": number, "name": name }))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn args(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        #[test]
        fn test_tooth_command() {
            let value = tooth(&args(&["11"])).unwrap();
            assert_eq!(value["name"], "Upper Right Central Incisor");
            assert!(matches!(tooth(&args(&["99"])), Err(CliError::Usage(_))));
            assert!(matches!(tooth(&args(&["x"])), Err(CliError::Usage(_))));
        }

        #[test]
        fn test_normalize_command_reads_arrays() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("findings.json");
            std::fs::write(
                &path,
                r#"[{ "location": [10, 10, 4, 2] }, { "class": "caries" }]"#,
            )
            .unwrap();

            let value = normalize(&args(&[path.to_str().unwrap()])).unwrap();
            assert_eq!(value[0]["x"], 8.0);
            assert_eq!(value[1], Value::Null);
        }

        #[test]
        fn test_gate_command() {
            let value = gate(&AppConfig::default(), &args(&["/patients"])).unwrap();
            assert_eq!(value["location"], "/login?redirect=%2Fpatients");
        }

        #[test]
        fn test_report_command_uses_configured_history() {
            let dir = tempfile::tempdir().unwrap();
            let mut config = AppConfig::default();
            config.storage.directory = Some(dir.path().join("state"));
            config.history.max_history = 1;

            let path = dir.path().join("report.json");
            std::fs::write(
                &path,
                r#"{ "patientId": 9, "info": { "fullName": "Ana", "age": null },
                     "teeth": [{ "toothNumber": 36, "problems": [{ "type": "Caries" }] }] }"#,
            )
            .unwrap();

            let loaded = report(&config, &args(&[path.to_str().unwrap()])).unwrap();
            assert_eq!(loaded["patientId"], "9");
            assert_eq!(loaded["status"]["teethCount"], 1);
            assert_eq!(loaded["problems"]["Caries"], 1);

            let stored = report(&config, &[]).unwrap();
            assert_eq!(stored["patientId"], "9");
            assert_eq!(stored["history"], 1);
        }

        #[test]
        fn test_layouts_command_persists_selection() {
            let dir = tempfile::tempdir().unwrap();
            let mut config = AppConfig::default();
            config.storage.directory = Some(dir.path().to_path_buf());

            layouts(&config, &args(&["COMPARISON"])).unwrap();
            let listed = layouts(&config, &[]).unwrap();
            let current: Vec<_> = listed
                .as_array()
                .unwrap()
                .iter()
                .filter(|e| e["current"] == true)
                .map(|e| e["key"].clone())
                .collect();
            assert_eq!(current, vec![Value::from("COMPARISON")]);
            assert!(matches!(
                layouts(&config, &args(&["NOPE"])),
                Err(CliError::Usage(_))
            ));
        }
    }
}
