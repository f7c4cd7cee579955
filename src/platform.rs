//! Host platform detection and shell selection.
use std::fmt;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux and other Unix-like systems.
    Unix,
    /// Microsoft Windows.
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix => write!(f, "unix"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            os: Self::detect_os(),
        }
    }

    /// Create a platform with an explicit OS (for testing).
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Whether this is a Windows host.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Translate a configured command for this platform.
    ///
    /// Module installers conventionally ship `install.sh` next to an
    /// `install.bat`; on Windows the shell script invocation is swapped for
    /// the batch file.
    #[must_use]
    pub fn translate_command(&self, command: &str) -> String {
        if self.is_windows() && command.trim() == "bash install.sh" {
            "cmd /c install.bat".to_string()
        } else {
            command.to_string()
        }
    }

    /// Program and leading arguments used to run a command string through
    /// the platform shell.
    #[must_use]
    pub const fn shell(&self) -> (&'static str, &'static str) {
        match self.os {
            Os::Unix => ("sh", "-c"),
            Os::Windows => ("cmd", "/C"),
        }
    }

    const fn detect_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::Unix
        }
    }
}
