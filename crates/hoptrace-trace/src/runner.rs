/// Output dialect of the system traceroute binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    pub fn default_program(self) -> &'static str {
        match self {
            Platform::Posix => "traceroute",
            Platform::Windows => "tracert",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraceSettings {
    pub platform: Platform,
    /// Replaces the platform binary, e.g. a wrapper script.
    pub program: Option<String>,
    /// Passed before the target.
    pub extra_args: Vec<String>,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            program: None,
            extra_args: Vec::new(),
        }
    }
}

impl TraceSettings {
    pub fn program(&self) -> &str {
        self.program
            .as_deref()
            .unwrap_or_else(|| self.platform.default_program())
    }

    /// Full argument vector for `target`, program excluded.
    pub fn args_for(&self, target: &str) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.push(target.to_string());
        args
    }
}
