//! Mock UI surface for testing and dry runs

use crate::config::{ElementIds, UiBackend};
use crate::surface::{
    AppTarget, ControlKind, ElementHandle, LaunchOutcome, Locator, UiSurface, WindowAction,
};
use crate::{MonitorError, Result};

use std::cell::RefCell;
use std::collections::VecDeque;
use tracing::{debug, info};

/// A scripted element inside the mock window
#[derive(Debug, Clone)]
pub struct MockElement {
    label: String,
    automation_id: Option<String>,
    control: ControlKind,
    texts: RefCell<VecDeque<String>>,
    cycle: bool,
    vanish_on_click: bool,
}

impl MockElement {
    /// Element whose reads walk through `texts`, repeating the last one
    pub fn new<I, T>(label: impl Into<String>, control: ControlKind, texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            label: label.into(),
            automation_id: None,
            control,
            texts: RefCell::new(texts.into_iter().map(Into::into).collect()),
            cycle: false,
            vanish_on_click: false,
        }
    }

    /// `Edit` element addressed by automation id
    pub fn edit<I, T>(automation_id: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let id = automation_id.into();
        Self::new(id.clone(), ControlKind::Edit, texts).with_automation_id(id)
    }

    pub fn button<I, T>(label: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(label, ControlKind::Button, texts)
    }

    pub fn list_item(title: impl Into<String>) -> Self {
        let title = title.into();
        Self::new(title.clone(), ControlKind::ListItem, [title])
    }

    pub fn with_automation_id(mut self, id: impl Into<String>) -> Self {
        self.automation_id = Some(id.into());
        self
    }

    /// Rotate through the texts forever instead of sticking on the last one
    pub fn cycling(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Remove the element from the window once clicked
    pub fn vanishing_on_click(mut self) -> Self {
        self.vanish_on_click = true;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn current_text(&self) -> String {
        self.texts.borrow().front().cloned().unwrap_or_default()
    }

    fn next_text(&self) -> String {
        let mut texts = self.texts.borrow_mut();
        if self.cycle {
            if let Some(text) = texts.pop_front() {
                texts.push_back(text.clone());
                return text;
            }
            return String::new();
        }
        if texts.len() > 1 {
            texts.pop_front().unwrap_or_default()
        } else {
            texts.front().cloned().unwrap_or_default()
        }
    }

    fn matches(&self, locator: &Locator) -> bool {
        let control_matches =
            |control: &ControlKind| *control == ControlKind::Any || *control == self.control;
        match locator {
            Locator::AutomationId { id, control } => {
                control_matches(control) && self.automation_id.as_deref() == Some(id.as_str())
            }
            Locator::Title { title, control } => {
                control_matches(control) && self.current_text() == *title
            }
            Locator::TextContains { needle, control } => {
                control_matches(control) && self.current_text().contains(needle.as_str())
            }
        }
    }
}

/// Mock UI surface with a scripted window tree
pub struct MockSurface {
    elements: Vec<Option<MockElement>>,
    running: bool,
    launch_error: Option<String>,
    window_present: bool,
    connected: bool,
    minimized: bool,
    pending_faults: usize,
    launches: usize,
    clicks: Vec<String>,
    window_actions: Vec<WindowAction>,
}

impl MockSurface {
    /// An empty window with no running instance
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            running: false,
            launch_error: None,
            window_present: true,
            connected: false,
            minimized: false,
            pending_faults: 0,
            launches: 0,
            clicks: Vec::new(),
            window_actions: Vec::new(),
        }
    }

    /// A compact-mode Task Manager with plausible gauges on the sidebar
    pub fn task_manager(ids: &ElementIds) -> Self {
        info!("Creating mock Task Manager surface");

        let cpu = [
            "12%", "18%", "25%", "9%", "31%", "22%", "15%", "27%", "11%", "19%",
        ];
        let memory = [
            "7.4/15.7 GB (47%)",
            "7.6/15.7 GB (48%)",
            "7.9/15.7 GB (50%)",
            "8.1/15.7 GB (52%)",
            "7.8/15.7 GB (50%)",
        ];
        let npu = [
            "NPU 0\n0%",
            "NPU 0\n3%",
            "NPU 0\n41%",
            "NPU 0\n38%",
            "NPU 0\n6%",
        ];

        Self::new()
            .with_element(MockElement::edit(&ids.cpu_automation_id, cpu).cycling())
            .with_element(MockElement::edit(&ids.memory_automation_id, memory).cycling())
            .with_element(MockElement::button(&ids.npu_button_text, npu).cycling())
            .with_element(MockElement::list_item(&ids.performance_tab_title))
            .with_element(
                MockElement::button(&ids.more_details_title, [ids.more_details_title.as_str()])
                    .vanishing_on_click(),
            )
    }

    pub fn with_element(mut self, element: MockElement) -> Self {
        self.elements.push(Some(element));
        self
    }

    /// Pretend an instance is already running so `connect_or_launch` attaches
    pub fn with_running_instance(mut self) -> Self {
        self.running = true;
        self
    }

    /// Make launching fail with `reason`
    pub fn with_launch_failure(mut self, reason: impl Into<String>) -> Self {
        self.launch_error = Some(reason.into());
        self
    }

    /// The application starts but its window never appears
    pub fn without_window(mut self) -> Self {
        self.window_present = false;
        self
    }

    /// Make the next `count` lookups fail with an automation error
    pub fn fail_next_finds(&mut self, count: usize) {
        self.pending_faults += count;
    }

    /// Drop an element from the window tree
    pub fn remove_element(&mut self, label: &str) {
        for slot in self.elements.iter_mut() {
            if slot.as_ref().map(|e| e.label() == label).unwrap_or(false) {
                *slot = None;
            }
        }
    }

    pub fn launches(&self) -> usize {
        self.launches
    }

    /// Labels of clicked elements, in order
    pub fn clicks(&self) -> &[String] {
        &self.clicks
    }

    pub fn window_actions(&self) -> &[WindowAction] {
        &self.window_actions
    }

    fn element(&self, handle: ElementHandle) -> Result<&MockElement> {
        self.elements
            .get(handle.0)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| MonitorError::ElementNotFound(format!("stale handle {}", handle.0)))
    }
}

impl Default for MockSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl UiSurface for MockSurface {
    fn backend(&self) -> UiBackend {
        UiBackend::Mock
    }

    fn connect_or_launch(&mut self, target: &AppTarget) -> Result<LaunchOutcome> {
        let outcome = if self.running {
            LaunchOutcome::Attached
        } else {
            if let Some(reason) = &self.launch_error {
                return Err(MonitorError::LaunchFailed(format!(
                    "{}: {}",
                    target.executable, reason
                )));
            }
            self.launches += 1;
            self.running = true;
            LaunchOutcome::Launched
        };

        if !self.window_present {
            return Err(MonitorError::WindowNotFound(target.window_title.clone()));
        }

        self.connected = true;
        debug!("Mock surface {:?} '{}'", outcome, target.window_title);
        Ok(outcome)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>> {
        if !self.connected {
            return Err(MonitorError::NotAttached);
        }
        if self.pending_faults > 0 {
            self.pending_faults -= 1;
            return Err(MonitorError::Automation(format!(
                "injected fault looking up {}",
                locator
            )));
        }

        let found = self
            .elements
            .iter()
            .position(|slot| slot.as_ref().map(|e| e.matches(locator)).unwrap_or(false))
            .map(ElementHandle);
        Ok(found)
    }

    fn read_text(&self, element: ElementHandle) -> Result<String> {
        Ok(self.element(element)?.next_text())
    }

    fn click(&mut self, element: ElementHandle) -> Result<()> {
        let (label, vanish) = {
            let e = self.element(element)?;
            (e.label().to_string(), e.vanish_on_click)
        };
        self.clicks.push(label);
        if vanish {
            self.elements[element.0] = None;
        }
        Ok(())
    }

    fn window(&mut self, action: WindowAction) -> Result<()> {
        if !self.connected {
            return Err(MonitorError::NotAttached);
        }
        self.window_actions.push(action);
        match action {
            WindowAction::Minimize => self.minimized = true,
            WindowAction::Maximize | WindowAction::Restore => self.minimized = false,
            WindowAction::Focus => {}
            WindowAction::Close => {
                self.connected = false;
                self.running = false;
            }
        }
        Ok(())
    }

    fn is_minimized(&self) -> Result<bool> {
        if !self.connected {
            return Err(MonitorError::NotAttached);
        }
        Ok(self.minimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;

    fn target() -> AppTarget {
        AppTarget::from_config(&MonitorConfig::new(UiBackend::Mock).without_settle_delays())
    }

    #[test]
    fn test_connect_launches_then_attaches() {
        let mut surface = MockSurface::task_manager(&ElementIds::default());
        assert_eq!(surface.connect_or_launch(&target()).unwrap(), LaunchOutcome::Launched);
        assert_eq!(surface.connect_or_launch(&target()).unwrap(), LaunchOutcome::Attached);
        assert_eq!(surface.launches(), 1);
        assert!(surface.is_connected());
    }

    #[test]
    fn test_launch_failure_and_missing_window() {
        let mut surface = MockSurface::new().with_launch_failure("access denied");
        let err = surface.connect_or_launch(&target()).unwrap_err();
        assert!(matches!(err, MonitorError::LaunchFailed(_)));
        assert!(err.is_fatal());

        let mut surface = MockSurface::new().without_window();
        let err = surface.connect_or_launch(&target()).unwrap_err();
        assert!(matches!(err, MonitorError::WindowNotFound(_)));
    }

    #[test]
    fn test_find_requires_connection() {
        let mut surface = MockSurface::task_manager(&ElementIds::default());
        let locator = Locator::automation_id("sidebar_cpu_util", ControlKind::Edit);
        assert!(matches!(surface.find(&locator), Err(MonitorError::NotAttached)));
    }

    #[test]
    fn test_find_by_each_locator_kind() {
        let ids = ElementIds::default();
        let mut surface = MockSurface::task_manager(&ids);
        surface.connect_or_launch(&target()).unwrap();

        let cpu = surface
            .find(&Locator::automation_id(&ids.cpu_automation_id, ControlKind::Edit))
            .unwrap();
        assert!(cpu.is_some());

        let wrong_kind = surface
            .find(&Locator::automation_id(&ids.cpu_automation_id, ControlKind::Button))
            .unwrap();
        assert!(wrong_kind.is_none());

        let tab = surface
            .find(&Locator::title("Performance", ControlKind::ListItem))
            .unwrap();
        assert!(tab.is_some());

        let npu = surface
            .find(&Locator::text_contains("NPU", ControlKind::Button))
            .unwrap()
            .unwrap();
        assert!(surface.read_text(npu).unwrap().contains("NPU"));
    }

    #[test]
    fn test_scripted_texts_repeat_last_value() {
        let mut surface = MockSurface::new()
            .with_running_instance()
            .with_element(MockElement::edit("gauge", ["1%", "2%"]));
        surface.connect_or_launch(&target()).unwrap();

        let handle = surface
            .find(&Locator::automation_id("gauge", ControlKind::Edit))
            .unwrap()
            .unwrap();
        assert_eq!(surface.read_text(handle).unwrap(), "1%");
        assert_eq!(surface.read_text(handle).unwrap(), "2%");
        assert_eq!(surface.read_text(handle).unwrap(), "2%");
    }

    #[test]
    fn test_injected_faults_are_consumed() {
        let mut surface = MockSurface::task_manager(&ElementIds::default());
        surface.connect_or_launch(&target()).unwrap();
        surface.fail_next_finds(1);

        let locator = Locator::automation_id("sidebar_cpu_util", ControlKind::Edit);
        assert!(matches!(surface.find(&locator), Err(MonitorError::Automation(_))));
        assert!(surface.find(&locator).unwrap().is_some());
    }

    #[test]
    fn test_click_and_window_journal() {
        let ids = ElementIds::default();
        let mut surface = MockSurface::task_manager(&ids);
        surface.connect_or_launch(&target()).unwrap();

        let more = Locator::title(&ids.more_details_title, ControlKind::Button);
        let handle = surface.find(&more).unwrap().unwrap();
        surface.click(handle).unwrap();
        assert_eq!(surface.clicks(), ["More details".to_string()]);
        assert!(surface.find(&more).unwrap().is_none());

        surface.window(WindowAction::Minimize).unwrap();
        assert!(surface.is_minimized().unwrap());
        surface.window(WindowAction::Restore).unwrap();
        assert!(!surface.is_minimized().unwrap());
        surface.window(WindowAction::Close).unwrap();
        assert!(!surface.is_connected());
        assert_eq!(
            surface.window_actions(),
            [WindowAction::Minimize, WindowAction::Restore, WindowAction::Close]
        );
    }
}
