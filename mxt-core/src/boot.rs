//! Boot sequencing
//!
//! ```text
//!             first boot                complete(token)
//! Unbooted ───────────────► Resetting ─────────────────► Booted
//!     ▲                        │  ▲                         │
//!     │ release                │  └──── resume ─────────────┤
//!     └────────────────────────┴────────────────────────────┘
//! ```
//!
//! First boot reads the object table, builds the [`ChipProfile`], drains
//! stale messages, reads the screen geometry and soft-resets the chip. The
//! chip needs time to come back from reset, so the sequencer hands out a
//! [`BootToken`] that the caller redeems once the boot delay has elapsed.
//!
//! Later boots (power resume) skip the table entirely: they restore the
//! running power configuration and reset again.
//!
//! Tokens carry a generation. Releasing the hardware or arming a new reset
//! bumps it, so a continuation that fires late finds nothing to do.

use mxt_hal::RegisterIo;
use mxt_protocol::hid::DeviceMode;
use mxt_protocol::message::{t100, t6, t9};

use crate::config::{DriverConfig, T7_DEEP_SLEEP};
use crate::contact::ContactTracker;
use crate::error::DeviceError;
use crate::object::{parse, ChipProfile, MultitouchMode, Rollup, T100Aux};
use crate::pump::MessagePump;

/// Bytes read from T44 once the boot delay has elapsed
pub const BOOT_FLUSH_LEN: usize = 7;

/// Boot progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootState {
    /// No profile; table not read yet or hardware released
    Unbooted,
    /// Reset issued, waiting for the boot delay
    Resetting,
    /// Chip ready
    Booted,
}

/// Pending boot continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootToken {
    generation: u32,
    delay_ms: u32,
}

impl BootToken {
    /// How long to wait before calling [`BootSequencer::complete`]
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }
}

/// First boot, resume and power-down of the controller
pub struct BootSequencer {
    config: DriverConfig,
    state: BootState,
    generation: u32,
    rollup: Option<Rollup>,
    profile: Option<ChipProfile>,
    mode: DeviceMode,
}

impl BootSequencer {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            state: BootState::Unbooted,
            generation: 0,
            rollup: None,
            profile: None,
            mode: DeviceMode::default(),
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    /// Reset has completed and the chip is ready
    pub fn is_booted(&self) -> bool {
        self.state == BootState::Booted
    }

    /// Profile of the booted chip
    pub fn profile(&self) -> Option<&ChipProfile> {
        self.profile.as_ref()
    }

    /// Object table read at first boot
    pub fn rollup(&self) -> Option<&Rollup> {
        self.rollup.as_ref()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Device mode selected by the host
    pub fn device_mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn set_device_mode(&mut self, mode: DeviceMode) {
        #[cfg(feature = "defmt")]
        defmt::info!("Device mode {}", mode);
        self.mode = mode;
    }

    /// Boot or resume the chip
    ///
    /// Returns a token when a first boot armed the post-reset delay; resume
    /// returns `None`. On a first-boot failure nothing is cached and the
    /// state stays [`BootState::Unbooted`].
    pub fn boot<IO: RegisterIo>(
        &mut self,
        io: &mut IO,
        pump: &mut Option<MessagePump>,
        contacts: &mut ContactTracker,
    ) -> Result<Option<BootToken>, DeviceError<IO::Error>> {
        match self.state {
            BootState::Unbooted => self.first_boot(io, pump, contacts).map(Some),
            BootState::Resetting | BootState::Booted => {
                self.resume(io)?;
                Ok(None)
            }
        }
    }

    fn first_boot<IO: RegisterIo>(
        &mut self,
        io: &mut IO,
        pump: &mut Option<MessagePump>,
        contacts: &mut ContactTracker,
    ) -> Result<BootToken, DeviceError<IO::Error>> {
        #[cfg(feature = "defmt")]
        defmt::info!("Initializing touch screen");

        let rollup = parse(io)?;
        let profile = ChipProfile::from_rollup(&rollup);
        if let Err(DeviceError::MissingRequiredObject(_t)) = &profile {
            #[cfg(feature = "defmt")]
            defmt::error!("Required object T{} missing", _t);
        }
        let mut profile = profile?;

        let mut new_pump = MessagePump::new(&profile);
        new_pump
            .drain_stale(io, &profile, contacts)
            .map_err(DeviceError::Io)?;

        match profile.multitouch {
            MultitouchMode::T9 => read_t9_resolution(io, &mut profile)?,
            MultitouchMode::T100 => read_t100_config(io, &mut profile)?,
            MultitouchMode::None => {}
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Screen size {}x{}", profile.max_x, profile.max_y);

        soft_reset(io, &profile)?;

        *pump = Some(new_pump);
        self.rollup = Some(rollup);
        self.profile = Some(profile);
        Ok(self.arm())
    }

    fn resume<IO: RegisterIo>(&mut self, io: &mut IO) -> Result<(), DeviceError<IO::Error>> {
        let profile = self.profile.as_ref().ok_or(DeviceError::NotBooted)?;

        match profile.multitouch {
            MultitouchMode::T100 => {
                if let Some(t7) = profile.t7_address {
                    io.write(t7, &self.config.t7_run()).map_err(DeviceError::Io)?;
                }
            }
            _ => {
                if let Some(t9_obj) = profile.t9 {
                    io.write_byte(t9_obj.address + t9::CTRL, self.config.t9_ctrl_run)
                        .map_err(DeviceError::Io)?;
                }
            }
        }

        soft_reset(io, profile)
    }

    /// Put the chip into its lowest power state
    pub fn power_down<IO: RegisterIo>(&mut self, io: &mut IO) -> Result<(), DeviceError<IO::Error>> {
        let profile = self.profile.as_ref().ok_or(DeviceError::NotBooted)?;

        match profile.multitouch {
            MultitouchMode::T100 => {
                if let Some(t7) = profile.t7_address {
                    io.write(t7, &T7_DEEP_SLEEP).map_err(DeviceError::Io)?;
                }
            }
            _ => {
                if let Some(t9_obj) = profile.t9 {
                    io.write_byte(t9_obj.address + t9::CTRL, t9::CTRL_OFF)
                        .map_err(DeviceError::Io)?;
                }
            }
        }
        Ok(())
    }

    fn arm(&mut self) -> BootToken {
        self.generation = self.generation.wrapping_add(1);
        self.state = BootState::Resetting;
        BootToken {
            generation: self.generation,
            delay_ms: self.config.boot_delay_ms,
        }
    }

    /// Finish a boot once the delay has elapsed
    ///
    /// Stale tokens are ignored. Returns whether the token was current.
    pub fn complete<IO: RegisterIo>(&mut self, io: &mut IO, token: BootToken) -> bool {
        if token.generation != self.generation || self.state != BootState::Resetting {
            #[cfg(feature = "defmt")]
            defmt::debug!("Ignoring stale boot continuation");
            return false;
        }

        if let Some(t44) = self.profile.as_ref().and_then(|p| p.t44_address) {
            // Flushes the message count left over from reset; the contents
            // are not used
            let mut flush = [0u8; BOOT_FLUSH_LEN];
            let _ = io.read(t44, &mut flush);
        }

        self.state = BootState::Booted;
        true
    }

    /// Drop everything learned from the chip
    pub fn release(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.state = BootState::Unbooted;
        self.rollup = None;
        self.profile = None;
    }
}

fn soft_reset<IO: RegisterIo>(io: &mut IO, profile: &ChipProfile) -> Result<(), DeviceError<IO::Error>> {
    io.write_byte(profile.t6_address + t6::RESET, t6::RESET_VALUE)
        .map_err(DeviceError::Io)
}

fn read_u8<IO: RegisterIo>(io: &mut IO, addr: u16) -> Result<u8, DeviceError<IO::Error>> {
    let mut b = [0u8; 1];
    io.read(addr, &mut b).map_err(DeviceError::Io)?;
    Ok(b[0])
}

fn read_u16<IO: RegisterIo>(io: &mut IO, addr: u16) -> Result<u16, DeviceError<IO::Error>> {
    let mut b = [0u8; 2];
    io.read(addr, &mut b).map_err(DeviceError::Io)?;
    Ok(u16::from_le_bytes(b))
}

fn read_t9_resolution<IO: RegisterIo>(
    io: &mut IO,
    profile: &mut ChipProfile,
) -> Result<(), DeviceError<IO::Error>> {
    let Some(base) = profile.t9.map(|t| t.address) else {
        return Ok(());
    };

    let mut range = [0u8; 4];
    io.read(base + t9::RANGE, &mut range).map_err(DeviceError::Io)?;
    let mut x_range = u16::from_le_bytes([range[0], range[1]]);
    let mut y_range = u16::from_le_bytes([range[2], range[3]]);

    let orient = read_u8(io, base + t9::ORIENT)?;

    if x_range == 0 {
        x_range = t9::DEFAULT_RANGE;
    }
    if y_range == 0 {
        y_range = t9::DEFAULT_RANGE;
    }

    if orient & t9::ORIENT_SWITCH != 0 {
        core::mem::swap(&mut x_range, &mut y_range);
    }
    profile.max_x = x_range.saturating_add(1);
    profile.max_y = y_range.saturating_add(1);
    Ok(())
}

fn read_t100_config<IO: RegisterIo>(
    io: &mut IO,
    profile: &mut ChipProfile,
) -> Result<(), DeviceError<IO::Error>> {
    let Some(base) = profile.t100.map(|t| t.address) else {
        return Ok(());
    };

    let x_range = read_u16(io, base + t100::XRANGE)?;
    let y_range = read_u16(io, base + t100::YRANGE)?;
    let cfg = read_u8(io, base + t100::CFG1)?;

    if cfg & t100::CFG_SWITCHXY != 0 {
        profile.max_x = y_range.saturating_add(1);
        profile.max_y = x_range.saturating_add(1);
    } else {
        profile.max_x = x_range.saturating_add(1);
        profile.max_y = y_range.saturating_add(1);
    }

    let tchaux = read_u8(io, base + t100::TCHAUX)?;
    profile.t100_aux = T100Aux::from_tchaux(tchaux);
    Ok(())
}
