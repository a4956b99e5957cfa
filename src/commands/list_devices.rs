//! List available audio output devices.

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::playback::device::suppress_alsa_warnings;

/// One row of the device listing.
struct DeviceRow {
    name: String,
    is_default: bool,
    config: Option<(u32, u16)>,
}

fn describe(index: usize, row: &DeviceRow) -> String {
    let default_indicator = if row.is_default { " [DEFAULT]" } else { "" };
    let config_info = match row.config {
        Some((rate, channels)) => format!(" ({rate}Hz, {channels} channels)"),
        None => " (configuration unavailable)".to_string(),
    };
    format!(
        "  ID: {index}\n    Name: {}{default_indicator}\n    Config:{config_info}\n",
        row.name
    )
}

/// Lists all audio output devices on the system.
///
/// IDs match the numeric `device` values accepted in the `[audio]` config.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let rows = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let default_name = host.default_output_device().and_then(|d| d.name().ok());

        let rows = host
            .output_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .map(|device| {
                let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
                DeviceRow {
                    is_default: default_name.as_deref() == Some(name.as_str()),
                    config: device
                        .default_output_config()
                        .ok()
                        .map(|c| (c.sample_rate().0, c.channels())),
                    name,
                }
            })
            .collect::<Vec<_>>();
        Ok(rows)
    })?;

    if rows.is_empty() {
        println!("No audio output devices found on this system.");
        return Ok(());
    }

    println!("Available audio output devices:");
    println!();
    for (index, row) in rows.iter().enumerate() {
        println!("{}", describe(index, row));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_marks_default() {
        let row = DeviceRow {
            name: "pipewire".to_string(),
            is_default: true,
            config: Some((48_000, 2)),
        };
        let text = describe(3, &row);
        assert!(text.contains("ID: 3"));
        assert!(text.contains("pipewire [DEFAULT]"));
        assert!(text.contains("48000Hz, 2 channels"));
    }

    #[test]
    fn test_describe_without_config() {
        let row = DeviceRow {
            name: "hdmi".to_string(),
            is_default: false,
            config: None,
        };
        assert!(describe(0, &row).contains("configuration unavailable"));
    }
}
