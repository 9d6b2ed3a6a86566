use {
    anyhow::{anyhow, bail, Error},
    log::{debug, trace},
    xcb::{base as xbase, randr as xrandr, xproto},
    std::rc::Rc,
};

use crate::{
    backend::legacy::ScreenSource,
    rotation::Rotation,
    screen::Screen,
};

#[cfg(any(test, feature = "randr-1-2"))]
use crate::{
    backend::randr::ResourceSource,
    output::{Crtc, Output},
    screen_resources::ScreenResources,
};

pub struct Connection {
    pub connection: xbase::Connection,
    screen_num: i32,
}

impl Connection {
    pub fn new() -> Result<Rc<Self>, Error> {
        let (connection, screen_num) = xbase::Connection::connect(None)
            .map_err(|e| anyhow!("Couldn't connect to the X server: {}", e))?;
        Ok(Rc::new(Connection {
            connection,
            screen_num,
        }))
    }

    pub fn setup<'a>(self: &'a Rc<Self>) -> xproto::Setup<'a> {
        self.connection.get_setup()
    }

    pub fn screen_count(self: &Rc<Self>) -> usize {
        self.setup().roots().count()
    }

    /// Index of the screen named by the display string.
    pub fn default_screen(&self) -> usize {
        self.screen_num as usize
    }

    pub fn roots(self: &Rc<Self>) -> Vec<xproto::Window> {
        self.setup().roots().map(|screen| screen.root()).collect()
    }

    #[cfg(any(test, feature = "randr-1-2"))]
    pub fn root_window(self: &Rc<Self>) -> Result<xproto::Window, Error> {
        self.setup()
            .roots()
            .nth(self.screen_num as usize)
            .map(|screen| screen.root())
            .ok_or_else(|| anyhow!("Couldn't get the default root screen"))
    }

    pub fn has_randr(&self) -> Result<bool, Error> {
        trace!("Checking for the RandR extension");
        Ok(xproto::query_extension(&self.connection, "RANDR")
            .get_reply()?
            .present())
    }

    pub fn randr_version(&self) -> Result<(u32, u32), Error> {
        let reply = xrandr::query_version(&self.connection, 1, 2)
            .get_reply()
            .map_err(|e| anyhow!("Couldn't query the RandR version: {}", e))?;
        Ok((reply.major_version(), reply.minor_version()))
    }

    pub fn get_screen_info(&self, root: xproto::Window) -> Result<Screen, Error> {
        let reply = xrandr::get_screen_info(&self.connection, root)
            .get_reply()
            .map_err(|e| anyhow!("Couldn't get screen info: {}", e))?;
        Ok(Screen::from_reply(root, &reply))
    }

    pub fn set_screen_config(
        &self,
        screen: &Screen,
        size_index: usize,
        rotation: Rotation,
        rate: u16,
    ) -> Result<(), Error> {
        let reply = xrandr::set_screen_config(
            &self.connection,
            screen.root,
            xproto::TIME_CURRENT_TIME,
            screen.config_timestamp,
            size_index as u16,
            rotation.bits(),
            rate,
        )
        .get_reply()
        .map_err(|e| anyhow!("Couldn't set screen config: {}", e))?;

        if reply.status() != xrandr::SET_CONFIG_SUCCESS as u8 {
            bail!("The server refused the screen configuration (status {})", reply.status());
        }
        Ok(())
    }

    #[cfg(any(test, feature = "randr-1-2"))]
    pub fn get_crtc_info(
        &self,
        crtc: xrandr::Crtc,
        timestamp: xproto::Timestamp,
    ) -> Result<Crtc, Error> {
        let reply = xrandr::get_crtc_info(&self.connection, crtc, timestamp)
            .get_reply()
            .map_err(|e| anyhow!("Couldn't get CRTC info: {}", e))?;
        Ok(Crtc {
            id: crtc,
            mode: reply.mode(),
            rotation: Rotation::from_bits_truncate(reply.rotation() as u16),
            rotations: Rotation::from_bits_truncate(reply.rotations() as u16),
            x: reply.x(),
            y: reply.y(),
        })
    }

    #[cfg(any(test, feature = "randr-1-2"))]
    pub fn get_output_info(
        &self,
        output: xrandr::Output,
        timestamp: xproto::Timestamp,
    ) -> Result<Output, Error> {
        let info = xrandr::get_output_info(&self.connection, output, timestamp)
            .get_reply()
            .map_err(|e| anyhow!("Couldn't get output info: {}", e))?;
        let connected = info.connection() == xrandr::CONNECTION_CONNECTED as u8;
        let crtc = if connected && info.crtc() != 0 {
            Some(self.get_crtc_info(info.crtc(), timestamp)?)
        } else {
            None
        };

        Ok(Output {
            id: output,
            name: String::from_utf8_lossy(info.name()).into_owned(),
            connected,
            crtc,
            modes: info.modes().to_vec(),
        })
    }

    #[cfg(any(test, feature = "randr-1-2"))]
    pub fn get_screen_resources_current(self: &Rc<Self>) -> Result<ScreenResources, Error> {
        let root = self.root_window()?;
        let reply = xrandr::get_screen_resources_current(&self.connection, root)
            .get_reply()
            .map_err(|e| anyhow!("Couldn't get screen resources: {}", e))?;
        let timestamp = reply.config_timestamp();

        let outputs = reply
            .outputs()
            .iter()
            .map(|output| self.get_output_info(*output, timestamp))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScreenResources {
            config_timestamp: timestamp,
            modes: ScreenResources::modes_from_reply(&reply),
            outputs,
        })
    }

    pub fn flush(&self) {
        self.connection.flush();
    }
}

impl ScreenSource for Rc<Connection> {
    fn screens(&self) -> Result<Vec<Screen>, Error> {
        let roots = self.roots();
        debug!("Querying screen info of {} screens", roots.len());
        roots
            .into_iter()
            .map(|root| self.get_screen_info(root))
            .collect()
    }

    fn default_screen(&self) -> usize {
        Connection::default_screen(self)
    }

    fn apply(
        &self,
        screen: &Screen,
        size_index: usize,
        rotation: Rotation,
        rate: u16,
    ) -> Result<(), Error> {
        self.set_screen_config(screen, size_index, rotation, rate)?;
        self.flush();
        Ok(())
    }
}

#[cfg(any(test, feature = "randr-1-2"))]
impl ResourceSource for Rc<Connection> {
    fn version(&self) -> Result<(u32, u32), Error> {
        let version = self.randr_version()?;
        debug!("RandR version {}.{}", version.0, version.1);
        Ok(version)
    }

    fn resources(&self) -> Result<ScreenResources, Error> {
        trace!("Querying screen resources");
        self.get_screen_resources_current()
    }

    fn apply(
        &self,
        resources: &ScreenResources,
        output: &Output,
        mode: xrandr::Mode,
        rotation: Rotation,
    ) -> Result<(), Error> {
        let crtc = output
            .crtc
            .as_ref()
            .ok_or_else(|| anyhow!("{} is not driven by a CRTC", output.name))?;

        let reply = xrandr::set_crtc_config(
            &self.connection,
            crtc.id,
            xproto::TIME_CURRENT_TIME,
            resources.config_timestamp,
            crtc.x,
            crtc.y,
            mode,
            rotation.bits(),
            &[output.id],
        )
        .get_reply()
        .map_err(|e| anyhow!("Couldn't set CRTC config: {}", e))?;

        if reply.status() != xrandr::SET_CONFIG_SUCCESS as u8 {
            bail!(
                "The server refused the configuration of {} (status {})",
                output.name,
                reply.status()
            );
        }
        self.flush();
        Ok(())
    }
}
