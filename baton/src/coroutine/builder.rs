use super::Coroutines;

/// Default prefix for the names of OS threads hosting logical threads.
const DEFAULT_NAME: &str = "baton";

/// Settings shared by every logical thread of a manager.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Prefix of OS thread names; threads are named `{name}-{id}`.
    pub(crate) name: String,

    /// Stack size of the OS threads, or the platform default.
    pub(crate) stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            stack_size: None,
        }
    }
}

/// Builder for configuring and creating a coroutine manager.
///
/// # Examples
///
/// ```rust,ignore
/// let co: Coroutines<Sprite> = CoroutinesBuilder::new()
///     .name("sprite")
///     .stack_size(256 * 1024)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoroutinesBuilder {
    config: Config,
}

impl CoroutinesBuilder {
    /// Creates a builder with default settings.
    ///
    /// OS threads are named `baton-{id}` and use the platform's default
    /// stack size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix used to name the OS thread of each logical thread.
    pub fn name(mut self, prefix: impl Into<String>) -> Self {
        self.config.name = prefix.into();
        self
    }

    /// Sets the stack size, in bytes, of each logical thread.
    ///
    /// # Panics
    ///
    /// Panics if `bytes == 0`.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        assert!(bytes > 0, "stack_size must be > 0");

        self.config.stack_size = Some(bytes);
        self
    }

    /// Builds the manager with the configured options.
    pub fn build<P>(self) -> Coroutines<P> {
        Coroutines::with_config(self.config)
    }
}
