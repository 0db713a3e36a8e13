use spectrum_core::{Result, SpectrumError};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Byte-wide register access to a single device on a two-wire bus.
pub trait RegisterBus: std::fmt::Debug {
    fn read_register(&mut self, reg: u8) -> Result<u8>;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<()>;

    /// Read `buf.len()` consecutive registers starting at `start`.
    fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<()>;

    /// Read-modify-write: set the bits in `set`, clear the bits in `clear`.
    /// Returns the value written.
    fn modify_register(&mut self, reg: u8, set: u8, clear: u8) -> Result<u8> {
        let value = (self.read_register(reg)? & !clear) | set;
        self.write_register(reg, value)?;
        Ok(value)
    }
}

/// `/dev/i2c-N` character device bound to one slave address.
#[derive(Debug)]
pub struct LinuxI2c {
    file: File,
    path: PathBuf,
    address: u16,
}

impl LinuxI2c {
    /// Open the bus device and select `address` for all later transfers.
    pub fn open(path: impl AsRef<Path>, address: u16) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| SpectrumError::Bus(format!("cannot open '{}': {e}", path.display())))?;

        select_address(&file, address)?;
        tracing::info!("Opened I2C bus '{}' at address {address:#04x}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
            address,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    fn bus_error(&self, op: &str, e: std::io::Error) -> SpectrumError {
        SpectrumError::Bus(format!(
            "{op} on '{}' at {:#04x}: {e}",
            self.path.display(),
            self.address
        ))
    }
}

impl RegisterBus for LinuxI2c {
    fn read_register(&mut self, reg: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_registers(reg, &mut buf)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        self.file
            .write_all(&[reg, value])
            .map_err(|e| self.bus_error("write", e))
    }

    fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<()> {
        self.file
            .write_all(&[start])
            .map_err(|e| self.bus_error("select register", e))?;
        self.file
            .read_exact(buf)
            .map_err(|e| self.bus_error("read", e))
    }
}

#[cfg(target_os = "linux")]
fn select_address(file: &File, address: u16) -> Result<()> {
    use std::os::fd::AsRawFd;

    /// `I2C_SLAVE` from `linux/i2c-dev.h`.
    const I2C_SLAVE: u32 = 0x0703;

    // SAFETY: `file` is an open descriptor for the lifetime of the call and
    // I2C_SLAVE takes the address by value.
    let ret = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            I2C_SLAVE as _,
            libc::c_ulong::from(address),
        )
    };
    if ret < 0 {
        return Err(SpectrumError::Bus(format!(
            "cannot select address {address:#04x}: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn select_address(_file: &File, _address: u16) -> Result<()> {
    Err(SpectrumError::Bus(format!(
        "I2C character devices are not supported on {}",
        std::env::consts::OS
    )))
}
