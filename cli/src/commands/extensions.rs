use iqs_core::extensions::{RegistryConfig, builtin_extensions};
use serde_json::json;

use crate::util::print_error;

pub fn list(
    name: Option<&str>,
    registry: Option<String>,
    cloud_host: Option<String>,
    cloud_port: Option<u16>,
) -> i32 {
    let mut config = RegistryConfig::default();
    if let Some(registry) = registry {
        config.image_registry = registry;
    }
    if let Some(host) = cloud_host {
        config.cloud_host = host;
    }
    if let Some(port) = cloud_port {
        config.cloud_port = port;
    }
    let extensions = builtin_extensions(&config);

    let output = match name {
        Some(name) => match extensions.get(name) {
            Some(info) => {
                let mut single = serde_json::Map::new();
                single.insert(name.to_string(), json!(info));
                serde_json::Value::Object(single)
            }
            None => {
                let known: Vec<&str> = extensions.keys().map(String::as_str).collect();
                print_error(
                    "not_found",
                    &format!("Unknown extension '{name}'"),
                    Some(&format!("Known extensions: {}", known.join(", "))),
                );
                return 1;
            }
        },
        None => json!(extensions),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(s) => {
            println!("{s}");
            0
        }
        Err(e) => {
            print_error("cli_error", &format!("Failed to render extensions: {e}"), None);
            2
        }
    }
}
