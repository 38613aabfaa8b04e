use core::fmt::{self, Debug, Display};

use crate::traits::Status;

/// The error type used by this library.
///
/// Bus level failures arrive as a [`Status`] from the wire; the driver adds
/// its own readiness and read errors on top of that.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The device did not acknowledge a readiness probe within the
    /// configured number of attempts.
    NotReady {
        /// Probes sent before giving up.
        probes: u32,
    },
    /// A read request returned no bytes.
    NoData,
    /// A transaction other than a readiness probe was not acknowledged.
    Transmission(Status),
}

#[cfg(feature = "defmt-03")]
impl defmt::Format for Error {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::NotReady { probes } => defmt::write!(fmt, "Error::NotReady({})", probes),
            Error::NoData => defmt::write!(fmt, "Error::NoData"),
            Error::Transmission(status) => defmt::write!(fmt, "Error::Transmission({})", status),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotReady { probes } => write!(f, "Error::NotReady({})", probes),
            Error::NoData => f.write_str("Error::NoData"),
            Error::Transmission(status) => write!(f, "Error::Transmission({:?})", status),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotReady { probes } => {
                write!(f, "device not ready after {} probes", probes)
            }
            Error::NoData => f.write_str("no data available from device"),
            Error::Transmission(status) => {
                write!(f, "transaction not acknowledged (status {})", status.code())
            }
        }
    }
}
