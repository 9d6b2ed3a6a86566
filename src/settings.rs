use {
    anyhow::{Context, Error},
    log::{debug, trace},
    zbus::dbus_proxy,
    zvariant::Value,
};

/// xfconf channel holding the display configuration.
pub const DISPLAYS_CHANNEL: &str = "displays";
/// Scheme the dialog saves into.
pub const DEFAULT_SCHEME: &str = "Default";

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Int(i32),
    Str(String),
}

/// Key/value store the dialog persists into.
pub trait SettingsStore {
    fn set(&self, property: &str, value: SettingValue) -> Result<(), Error>;
}

/// `/<scheme>/<section>/<key>`
pub fn property_path(scheme: &str, section: &str, key: &str) -> String {
    format!("/{}/{}/{}", scheme, section, key)
}

#[dbus_proxy(
    interface = "org.xfce.Xfconf",
    default_service = "org.xfce.Xfconf",
    default_path = "/org/xfce/Xfconf"
)]
trait Xfconf {
    fn set_property(&self, channel: &str, property: &str, value: &Value<'_>) -> zbus::Result<()>;

    fn list_channels(&self) -> zbus::Result<Vec<String>>;
}

pub struct XfconfStore {
    proxy: XfconfProxyBlocking<'static>,
    channel: String,
}

impl XfconfStore {
    pub fn connect(channel: &str) -> Result<Self, Error> {
        trace!("Connecting to xfconf");
        let connection = zbus::blocking::Connection::session()
            .context("Couldn't connect to the session bus")?;
        let proxy = XfconfProxyBlocking::new(&connection)?;

        // The proxy is lazy, make sure the daemon actually answers.
        let channels = proxy
            .list_channels()
            .context("Failed to connect to xfconf daemon")?;
        debug!("xfconf channels: {:?}", channels);

        Ok(XfconfStore {
            proxy,
            channel: channel.to_owned(),
        })
    }
}

impl SettingsStore for XfconfStore {
    fn set(&self, property: &str, value: SettingValue) -> Result<(), Error> {
        debug!("{}{} = {:?}", self.channel, property, value);
        let value = match &value {
            SettingValue::Int(int) => Value::from(*int),
            SettingValue::Str(string) => Value::from(string.as_str()),
        };
        self.proxy
            .set_property(&self.channel, property, &value)
            .with_context(|| format!("Couldn't store {} in channel {}", property, self.channel))
    }
}

#[cfg(test)]
pub mod testing {
    use {
        super::*,
        std::{cell::RefCell, collections::BTreeMap},
    };

    #[derive(Default)]
    pub struct MemoryStore {
        pub values: RefCell<BTreeMap<String, SettingValue>>,
        pub unreachable: bool,
    }

    impl MemoryStore {
        pub fn get(&self, property: &str) -> Option<SettingValue> {
            self.values.borrow().get(property).cloned()
        }
    }

    impl SettingsStore for MemoryStore {
        fn set(&self, property: &str, value: SettingValue) -> Result<(), Error> {
            if self.unreachable {
                anyhow::bail!("Failed to set {}", property);
            }
            self.values.borrow_mut().insert(property.to_owned(), value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_live_under_the_scheme() {
        assert_eq!(
            property_path(DEFAULT_SCHEME, "Screen_0", "Resolution"),
            "/Default/Screen_0/Resolution"
        );
    }
}
