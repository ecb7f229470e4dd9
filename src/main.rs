// mpEdit: terminal editor for MicroPython scripts

use std::io;
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use mpedit::config::Config;
use mpedit::script::{ScriptFile, STARTER_SCRIPT};
use mpedit::ui::App;
use mpedit::{logging, ports};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "mpedit", version, about = "Edit a MicroPython script and run it on a board")]
struct Args {
    /// Script to open. Created on first save if it does not exist.
    path: Option<PathBuf>,
    /// Serial port to select at startup (overrides `default_port` in the config)
    #[arg(short, long)]
    port: Option<String>,
    /// Configuration file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

fn install_panic_hook() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        // Leave the alternate screen so the panic message is readable
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        error!(%info, "panic");
        default_panic(info);
    }));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _log_guard = logging::init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(port) = args.port {
        config.default_port = Some(port);
    }

    // Fails on hosts without a serial naming convention
    let found_ports = ports::scan()?;
    info!(count = found_ports.len(), "startup port scan");

    let (script, text) = match &args.path {
        Some(path) => ScriptFile::load(path, &config.extension)?,
        None => (ScriptFile::new(&config.extension), STARTER_SCRIPT.to_string()),
    };

    let mut app = App::new(&config, script, &text, found_ports);

    // Set up terminal
    install_panic_hook();
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "event loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
