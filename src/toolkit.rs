use {
    gtk::{gdk, glib},
    log::debug,
    std::env,
    structopt::StructOpt,
};

// GTK and GDK standard options. `gtk::init` never sees argv, so they are
// parsed here and handed over through the environment and GLib setters.
#[derive(StructOpt, Debug, Default)]
pub struct ToolkitOptions {
    /// X display to use
    #[structopt(long = "display", value_name = "DISPLAY")]
    pub display: Option<String>,

    /// Program class as used by the window manager
    #[structopt(long = "class", value_name = "CLASS")]
    pub class: Option<String>,

    /// Program name as used by the window manager
    #[structopt(long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Load additional GTK+ modules
    #[structopt(long = "gtk-module", value_name = "MODULES")]
    pub gtk_modules: Vec<String>,

    /// Make all warnings fatal
    #[structopt(long = "g-fatal-warnings")]
    pub fatal_warnings: bool,

    /// GTK+ debugging flags to set
    #[structopt(long = "gtk-debug", value_name = "FLAGS")]
    pub gtk_debug: Option<String>,

    /// GDK debugging flags to set
    #[structopt(long = "gdk-debug", value_name = "FLAGS")]
    pub gdk_debug: Option<String>,

    /// Make X calls synchronous
    #[structopt(long = "sync")]
    pub sync: bool,
}

impl ToolkitOptions {
    /// Variables GTK, GDK and xcb read at initialization.
    pub fn environment(&self) -> Vec<(&'static str, String)> {
        let mut vars = Vec::new();
        if let Some(display) = &self.display {
            vars.push(("DISPLAY", display.clone()));
        }
        if !self.gtk_modules.is_empty() {
            vars.push(("GTK_MODULES", self.gtk_modules.join(":")));
        }
        if let Some(flags) = &self.gtk_debug {
            vars.push(("GTK_DEBUG", flags.clone()));
        }
        if let Some(flags) = &self.gdk_debug {
            vars.push(("GDK_DEBUG", flags.clone()));
        }
        if self.sync {
            vars.push(("GDK_SYNCHRONIZE", "1".to_owned()));
        }
        vars
    }

    /// Must run before `gtk::init` and before connecting to X.
    pub fn apply(&self) {
        for (key, value) in self.environment() {
            debug!("{}={}", key, value);
            env::set_var(key, value);
        }
        if let Some(name) = &self.name {
            glib::set_prgname(Some(name.as_str()));
        }
        if let Some(class) = &self.class {
            gdk::set_program_class(class);
        }
        if self.fatal_warnings {
            glib::log_set_always_fatal(
                glib::LogLevels::LEVEL_WARNING | glib::LogLevels::LEVEL_CRITICAL,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_exported() {
        let options = ToolkitOptions {
            display: Some(":1".to_owned()),
            sync: true,
            ..Default::default()
        };
        assert_eq!(
            options.environment(),
            vec![("DISPLAY", ":1".to_owned()), ("GDK_SYNCHRONIZE", "1".to_owned())]
        );
    }

    #[test]
    fn gtk_modules_are_joined() {
        let options = ToolkitOptions {
            gtk_modules: vec!["gail".to_owned(), "atk-bridge".to_owned()],
            ..Default::default()
        };
        assert_eq!(options.environment(), vec![("GTK_MODULES", "gail:atk-bridge".to_owned())]);
    }

    #[test]
    fn nothing_set_by_default() {
        assert!(ToolkitOptions::default().environment().is_empty());
    }
}
