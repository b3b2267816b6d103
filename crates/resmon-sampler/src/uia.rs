//! Windows UI Automation backend

use crate::config::UiBackend;
use crate::surface::{
    AppTarget, ControlKind, ElementHandle, LaunchOutcome, Locator, UiSurface, WindowAction,
};
use crate::{MonitorError, Result};

use std::collections::HashMap;
use std::process::Command;
use tracing::{debug, info};
use uiautomation::controls::ControlType;
use uiautomation::errors::{ERR_NOTFOUND, ERR_TIMEOUT};
use uiautomation::patterns::{UIInvokePattern, UIWindowPattern};
use uiautomation::types::WindowVisualState;
use uiautomation::{UIAutomation, UIElement, UIMatcher};

/// How long a single element lookup may poll before reporting "absent"
const FIND_TIMEOUT_MS: u64 = 200;

/// UI surface backed by the Windows UI Automation COM API
pub struct UiaSurface {
    automation: UIAutomation,
    window: Option<UIElement>,
    elements: Vec<UIElement>,
    slots: HashMap<Locator, usize>,
}

impl UiaSurface {
    pub fn new() -> Result<Self> {
        let automation = UIAutomation::new().map_err(automation_error)?;
        info!("UI Automation initialized");
        Ok(Self {
            automation,
            window: None,
            elements: Vec::new(),
            slots: HashMap::new(),
        })
    }

    fn find_window(&self, target: &AppTarget) -> Result<Option<UIElement>> {
        let root = self.automation.get_root_element().map_err(automation_error)?;
        let matcher = self
            .automation
            .create_matcher()
            .from(root)
            .depth(2)
            .timeout(target.connect_timeout.as_millis() as u64)
            .control_type(ControlType::Window)
            .contains_name(target.window_title.as_str());
        not_found_as_none(matcher.find_first())
    }

    fn attached(&self) -> Result<&UIElement> {
        self.window.as_ref().ok_or(MonitorError::NotAttached)
    }

    fn window_pattern(&self) -> Result<UIWindowPattern> {
        self.attached()?
            .get_pattern::<UIWindowPattern>()
            .map_err(automation_error)
    }

    fn element(&self, handle: ElementHandle) -> Result<&UIElement> {
        self.elements
            .get(handle.0)
            .ok_or_else(|| MonitorError::ElementNotFound(format!("stale handle {}", handle.0)))
    }

    fn matcher(&self, window: &UIElement, locator: &Locator) -> UIMatcher {
        let mut matcher = self
            .automation
            .create_matcher()
            .from(window.clone())
            .timeout(FIND_TIMEOUT_MS);
        if let Some(control_type) = control_type(locator.control()) {
            matcher = matcher.control_type(control_type);
        }
        match locator {
            Locator::AutomationId { id, .. } => {
                let id = id.clone();
                matcher.filter_fn(Box::new(move |e: &UIElement| {
                    Ok(e.get_automation_id()? == id)
                }))
            }
            Locator::Title { title, .. } => matcher.name(title.as_str()),
            Locator::TextContains { needle, .. } => matcher.contains_name(needle.as_str()),
        }
    }
}

impl UiSurface for UiaSurface {
    fn backend(&self) -> UiBackend {
        UiBackend::Uia
    }

    fn connect_or_launch(&mut self, target: &AppTarget) -> Result<LaunchOutcome> {
        self.elements.clear();
        self.slots.clear();

        if let Some(window) = self.find_window(target)? {
            debug!("Found existing '{}' window", target.window_title);
            self.window = Some(window);
            return Ok(LaunchOutcome::Attached);
        }

        info!("Starting {}", target.executable);
        Command::new(&target.executable)
            .spawn()
            .map_err(|e| MonitorError::LaunchFailed(format!("{}: {}", target.executable, e)))?;
        std::thread::sleep(target.launch_settle);

        let window = self
            .find_window(target)?
            .ok_or_else(|| MonitorError::WindowNotFound(target.window_title.clone()))?;
        self.window = Some(window);
        Ok(LaunchOutcome::Launched)
    }

    fn is_connected(&self) -> bool {
        self.window.is_some()
    }

    fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>> {
        let window = self.attached()?;
        let Some(element) = not_found_as_none(self.matcher(window, locator).find_first())? else {
            return Ok(None);
        };

        let slot = match self.slots.get(locator) {
            Some(&slot) => {
                self.elements[slot] = element;
                slot
            }
            None => {
                self.elements.push(element);
                let slot = self.elements.len() - 1;
                self.slots.insert(locator.clone(), slot);
                slot
            }
        };
        Ok(Some(ElementHandle(slot)))
    }

    fn read_text(&self, element: ElementHandle) -> Result<String> {
        self.element(element)?.get_name().map_err(automation_error)
    }

    fn click(&mut self, element: ElementHandle) -> Result<()> {
        let element = self.element(element)?;
        match element.get_pattern::<UIInvokePattern>() {
            Ok(invoke) => invoke.invoke().map_err(automation_error),
            Err(_) => element.click().map_err(automation_error),
        }
    }

    fn window(&mut self, action: WindowAction) -> Result<()> {
        match action {
            WindowAction::Maximize => self
                .window_pattern()?
                .set_window_visual_state(WindowVisualState::Maximized)
                .map_err(automation_error),
            WindowAction::Minimize => self
                .window_pattern()?
                .set_window_visual_state(WindowVisualState::Minimized)
                .map_err(automation_error),
            WindowAction::Restore => self
                .window_pattern()?
                .set_window_visual_state(WindowVisualState::Normal)
                .map_err(automation_error),
            WindowAction::Focus => self.attached()?.set_focus().map_err(automation_error),
            WindowAction::Close => {
                self.window_pattern()?.close().map_err(automation_error)?;
                self.window = None;
                self.elements.clear();
                self.slots.clear();
                Ok(())
            }
        }
    }

    fn is_minimized(&self) -> Result<bool> {
        let state = self
            .window_pattern()?
            .get_window_visual_state()
            .map_err(automation_error)?;
        Ok(matches!(state, WindowVisualState::Minimized))
    }
}

fn control_type(kind: ControlKind) -> Option<ControlType> {
    match kind {
        ControlKind::Window => Some(ControlType::Window),
        ControlKind::Button => Some(ControlType::Button),
        ControlKind::Edit => Some(ControlType::Edit),
        ControlKind::ListItem => Some(ControlType::ListItem),
        ControlKind::Text => Some(ControlType::Text),
        ControlKind::Any => None,
    }
}

fn not_found_as_none(result: uiautomation::Result<UIElement>) -> Result<Option<UIElement>> {
    match result {
        Ok(element) => Ok(Some(element)),
        Err(e) if e.code() == ERR_NOTFOUND || e.code() == ERR_TIMEOUT => Ok(None),
        Err(e) => Err(automation_error(e)),
    }
}

fn automation_error(e: uiautomation::Error) -> MonitorError {
    MonitorError::Automation(e.to_string())
}
