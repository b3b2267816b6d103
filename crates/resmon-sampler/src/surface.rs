//! UI surface abstraction over the accessibility API

use crate::config::{MonitorConfig, UiBackend};
use crate::{MonitorError, Result};

use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Control types the sampler looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Window,
    Button,
    Edit,
    ListItem,
    Text,
    /// Match regardless of control type
    Any,
}

/// How to find an element below the attached window
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Exact automation id
    AutomationId { id: String, control: ControlKind },
    /// Exact element title
    Title { title: String, control: ControlKind },
    /// First element whose text contains `needle`
    TextContains { needle: String, control: ControlKind },
}

impl Locator {
    pub fn automation_id(id: impl Into<String>, control: ControlKind) -> Self {
        Locator::AutomationId {
            id: id.into(),
            control,
        }
    }

    pub fn title(title: impl Into<String>, control: ControlKind) -> Self {
        Locator::Title {
            title: title.into(),
            control,
        }
    }

    pub fn text_contains(needle: impl Into<String>, control: ControlKind) -> Self {
        Locator::TextContains {
            needle: needle.into(),
            control,
        }
    }

    pub fn control(&self) -> ControlKind {
        match self {
            Locator::AutomationId { control, .. }
            | Locator::Title { control, .. }
            | Locator::TextContains { control, .. } => *control,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::AutomationId { id, control } => write!(f, "{:?}[auto_id={}]", control, id),
            Locator::Title { title, control } => write!(f, "{:?}[title={}]", control, title),
            Locator::TextContains { needle, control } => {
                write!(f, "{:?}[text~={}]", control, needle)
            }
        }
    }
}

/// Handle to an element found by a backend.
///
/// A handle stays valid until the same locator is looked up again or the
/// surface reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub(crate) usize);

/// Window-level actions on the attached application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAction {
    Maximize,
    Minimize,
    Restore,
    Focus,
    Close,
}

/// Application to attach to or launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTarget {
    /// Executable launched when no window is found
    pub executable: String,
    /// Window title pattern (substring match)
    pub window_title: String,
    /// How long to look for an existing window
    pub connect_timeout: Duration,
    /// Pause after launching before looking for the window
    pub launch_settle: Duration,
}

impl AppTarget {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            executable: config.elements.executable.clone(),
            window_title: config.elements.window_title.clone(),
            connect_timeout: config.connect_timeout(),
            launch_settle: config.launch_settle(),
        }
    }
}

/// Result of `connect_or_launch`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// An existing instance was found
    Attached,
    /// A new instance was started
    Launched,
}

/// The capabilities the sampler needs from an accessibility API
pub trait UiSurface {
    /// Backend behind this surface
    fn backend(&self) -> UiBackend;

    /// Attach to a running instance, or launch one if none is found
    fn connect_or_launch(&mut self, target: &AppTarget) -> Result<LaunchOutcome>;

    /// Whether a window is currently attached
    fn is_connected(&self) -> bool;

    /// Find an element; `Ok(None)` when it does not exist
    fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>>;

    /// Read an element's text
    fn read_text(&self, element: ElementHandle) -> Result<String>;

    /// Click an element
    fn click(&mut self, element: ElementHandle) -> Result<()>;

    /// Apply a window-level action to the attached window
    fn window(&mut self, action: WindowAction) -> Result<()>;

    /// Whether the attached window is minimized
    fn is_minimized(&self) -> Result<bool>;
}

impl<S: UiSurface + ?Sized> UiSurface for Box<S> {
    fn backend(&self) -> UiBackend {
        (**self).backend()
    }

    fn connect_or_launch(&mut self, target: &AppTarget) -> Result<LaunchOutcome> {
        (**self).connect_or_launch(target)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>> {
        (**self).find(locator)
    }

    fn read_text(&self, element: ElementHandle) -> Result<String> {
        (**self).read_text(element)
    }

    fn click(&mut self, element: ElementHandle) -> Result<()> {
        (**self).click(element)
    }

    fn window(&mut self, action: WindowAction) -> Result<()> {
        (**self).window(action)
    }

    fn is_minimized(&self) -> Result<bool> {
        (**self).is_minimized()
    }
}

/// Create a backend-specific UI surface
pub fn create_surface(config: &MonitorConfig) -> Result<Box<dyn UiSurface>> {
    config.validate().map_err(MonitorError::Configuration)?;
    info!("Creating UI surface for backend: {}", config.backend);

    match config.backend {
        #[cfg(all(windows, feature = "uia"))]
        UiBackend::Uia => {
            let surface = crate::uia::UiaSurface::new()?;
            Ok(Box::new(surface))
        }

        #[cfg(any(feature = "mock", test))]
        UiBackend::Mock => {
            let surface = crate::mock::MockSurface::task_manager(&config.elements);
            Ok(Box::new(surface))
        }

        #[allow(unreachable_patterns)]
        _ => {
            warn!(
                "UI backend {} not supported on this platform or feature not enabled",
                config.backend
            );
            Err(MonitorError::UnsupportedBackend(config.backend.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_display() {
        let locator = Locator::automation_id("sidebar_cpu_util", ControlKind::Edit);
        assert_eq!(locator.to_string(), "Edit[auto_id=sidebar_cpu_util]");
        assert_eq!(locator.control(), ControlKind::Edit);

        let locator = Locator::text_contains("NPU", ControlKind::Button);
        assert_eq!(locator.to_string(), "Button[text~=NPU]");
    }

    #[test]
    fn test_app_target_from_config() {
        let config = MonitorConfig::new(UiBackend::Mock);
        let target = AppTarget::from_config(&config);
        assert_eq!(target.executable, "taskmgr.exe");
        assert_eq!(target.window_title, "Task Manager");
        assert_eq!(target.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_create_mock_surface() {
        let config = MonitorConfig::new(UiBackend::Mock);
        let surface = create_surface(&config).unwrap();
        assert_eq!(surface.backend(), UiBackend::Mock);
        assert!(!surface.is_connected());
    }

    #[cfg(not(all(windows, feature = "uia")))]
    #[test]
    fn test_unsupported_backend() {
        let config = MonitorConfig::new(UiBackend::Uia);
        let result = create_surface(&config);
        assert!(matches!(result, Err(MonitorError::UnsupportedBackend(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MonitorConfig::new(UiBackend::Mock).with_interval(Duration::ZERO);
        assert!(matches!(
            create_surface(&config),
            Err(MonitorError::Configuration(_))
        ));
    }
}
