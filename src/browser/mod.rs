use std::path::Path;
use std::process::Command;
use anyhow::{anyhow, Context};
use log::info;

/// Open a file with the OS default handler, for a saved chart this is the web browser.
pub(crate) fn open_in_browser(file_path: &Path) -> anyhow::Result<()> {
    let mut command = open_command(std::env::consts::OS)?;
    command.arg(file_path);

    info!("Opening {} in browser", file_path.display());
    let status = command.status().with_context(|| format!("Unable to run {:?}", command))?;
    if !status.success() {
        return Err(anyhow!("{:?} exited with {}", command, status));
    }
    Ok(())
}

fn open_command(os: &str) -> anyhow::Result<Command> {
    match os {
        "linux" | "freebsd" | "openbsd" | "netbsd" => Ok(Command::new("xdg-open")),
        "macos" => Ok(Command::new("open")),
        "windows" => {
            let mut command = Command::new("cmd");
            // Empty string is the window title argument of `start`
            command.args(["/C", "start", ""]);
            Ok(command)
        }
        _ => Err(anyhow!("Opening a browser is not supported on {}", os)),
    }
}

#[cfg(test)]
mod tests {
    use crate::browser::open_command;

    #[test]
    fn test_open_command() {
        assert_eq!(open_command("linux").unwrap().get_program(), "xdg-open");
        assert_eq!(open_command("macos").unwrap().get_program(), "open");

        let command = open_command("windows").unwrap();
        assert_eq!(command.get_program(), "cmd");
        assert_eq!(command.get_args().collect::<Vec<_>>(), vec!["/C", "start", ""]);

        assert!(open_command("ios").is_err());
    }
}
