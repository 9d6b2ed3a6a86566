mod backend;
mod choices;
mod conn;
mod dialog;
mod geometry;
#[cfg(any(test, feature = "randr-1-2"))]
mod output;
mod rotation;
mod screen;
#[cfg(any(test, feature = "randr-1-2"))]
mod screen_resources;
mod settings;
mod toolkit;

use {
    anyhow::{anyhow, Error},
    gtk::prelude::*,
    log::{error, info, trace},
    std::{process, rc::Rc},
    structopt::{clap::AppSettings, StructOpt},
};

use crate::{
    backend::{legacy::LegacyBackend, Backend},
    conn::Connection,
    dialog::{show_error, DisplayDialog},
    settings::{XfconfStore, DEFAULT_SCHEME, DISPLAYS_CHANNEL},
    toolkit::ToolkitOptions,
};

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[derive(StructOpt)]
#[structopt(
    name = "display-settings",
    about = "Change the resolution, refresh rate and rotation of your displays",
    global_settings = &[AppSettings::DisableVersion]
)]
struct Options {
    /// Version information
    #[structopt(short = "v", long = "version")]
    version: bool,

    #[structopt(flatten)]
    toolkit: ToolkitOptions,
}

fn version_banner() -> String {
    // authors are "Name <address>"
    let contact = AUTHORS
        .split(|c| c == '<' || c == '>')
        .nth(1)
        .unwrap_or(AUTHORS);
    format!(
        "{} {}\n\nCopyright (c) {}\n\nPlease report bugs to <{}>.",
        NAME, VERSION, AUTHORS, contact
    )
}

/// Startup failure, logged by `main` before exiting with status 1.
struct StartupError(Error);

impl Options {
    fn run(self) -> Result<(), StartupError> {
        if self.version {
            println!("{}", version_banner());
            return Ok(());
        }

        self.toolkit.apply();

        if let Err(e) = gtk::init() {
            eprintln!("{}: {}.", NAME, e);
            eprintln!("Type '{} --help' for usage.", NAME);
            return Err(StartupError(e.into()));
        }

        let cm = Connection::new().map_err(StartupError)?;
        if !cm.has_randr().map_err(StartupError)? {
            let display = gtk::gdk::Display::default()
                .map(|display| display.name().to_string())
                .unwrap_or_default();
            show_error(
                None,
                &format!("RandR extension missing on display \"{}\"", display),
                "The Resize and Rotate extension (RandR) is not enabled on this display. \
                 Try to enable it and run the dialog again.",
                "_Quit",
            );
            return Err(StartupError(anyhow!(
                "RandR extension missing on display {:?}",
                display
            )));
        }
        match cm.randr_version() {
            Ok((major, minor)) => {
                info!("RandR {}.{} on {} screens", major, minor, cm.screen_count())
            }
            Err(e) => error!("{:#}", e),
        }

        let store = XfconfStore::connect(DISPLAYS_CHANNEL).map_err(StartupError)?;

        let backend = match create_backend(&cm) {
            Ok(backend) => backend,
            Err(e) => {
                show_error(None, "Failed to use the RandR extension", &format!("{:#}", e), "_Quit");
                return Err(StartupError(e));
            }
        };

        let display_dialog = DisplayDialog::new(backend, Box::new(store), DEFAULT_SCHEME);
        display_dialog.dialog.show_all();

        trace!("Entering main loop");
        gtk::main();

        display_dialog.dialog.close();
        Ok(())
    }
}

#[cfg(feature = "randr-1-2")]
fn create_backend(cm: &Rc<Connection>) -> Result<Box<dyn Backend>, Error> {
    use crate::backend::randr::RandrBackend;

    // outputs can only be mapped onto the screen when there is exactly one
    if cm.screen_count() == 1 {
        match RandrBackend::new(cm.clone()) {
            Ok(backend) => {
                info!("Using the RandR 1.2 backend");
                return Ok(Box::new(backend));
            }
            Err(e) => info!("RandR 1.2 backend unavailable: {:#}", e),
        }
    }
    create_legacy_backend(cm)
}

#[cfg(not(feature = "randr-1-2"))]
fn create_backend(cm: &Rc<Connection>) -> Result<Box<dyn Backend>, Error> {
    create_legacy_backend(cm)
}

fn create_legacy_backend(cm: &Rc<Connection>) -> Result<Box<dyn Backend>, Error> {
    info!("Using the legacy RandR backend");
    Ok(Box::new(LegacyBackend::new(cm.clone())?))
}

fn main() {
    env_logger::init();

    let code = match Options::from_args().run() {
        Ok(()) => 0,
        Err(StartupError(e)) => {
            error!("{:#}", e);
            1
        }
    };
    process::exit(code);
}
