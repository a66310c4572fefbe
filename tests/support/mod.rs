#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use secrecy::SecretString;

use networth::browser::{ElementRef, Locator, PageError, RemotePage, TabHandle};
use networth::credentials::{CredentialError, CredentialProvider, Credentials};
use networth::notify::Notifier;

pub const MAIN_TAB: &str = "tab-main";

/// What interacting with a fake element does to the fake portal.
#[derive(Debug, Clone)]
pub enum Effect {
    None,
    /// Replace the current tab's screen.
    GoTo(String),
    /// Open a new tab showing the named screen, without switching to it.
    OpenTab { handle: String, screen: String },
}

impl Effect {
    pub fn go_to(screen: impl Into<String>) -> Self {
        Effect::GoTo(screen.into())
    }

    pub fn open_tab(handle: impl Into<String>, screen: impl Into<String>) -> Self {
        Effect::OpenTab {
            handle: handle.into(),
            screen: screen.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    locator: Locator,
    displayed: bool,
    text: String,
    on_click: Effect,
    on_enter: Effect,
}

impl FakeElement {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            displayed: true,
            text: String::new(),
            on_click: Effect::None,
            on_enter: Effect::None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click = effect;
        self
    }

    pub fn on_enter(mut self, effect: Effect) -> Self {
        self.on_enter = effect;
        self
    }
}

struct FakeState {
    screens: HashMap<String, Vec<FakeElement>>,
    landing: HashMap<String, String>,
    tabs: HashMap<String, String>,
    current_tab: String,
    /// ElementRef id -> (screen the element was found on, index in it).
    refs: Vec<(String, usize)>,
    typed: Vec<(Locator, String)>,
    navigations: Vec<String>,
}

/// Scripted in-memory stand-in for a browser session. Screens are named
/// element lists; navigation and click/enter effects move tabs between them.
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        let mut screens = HashMap::new();
        screens.insert("blank".to_string(), Vec::new());
        let mut tabs = HashMap::new();
        tabs.insert(MAIN_TAB.to_string(), "blank".to_string());

        Self {
            state: Mutex::new(FakeState {
                screens,
                landing: HashMap::new(),
                tabs,
                current_tab: MAIN_TAB.to_string(),
                refs: Vec::new(),
                typed: Vec::new(),
                navigations: Vec::new(),
            }),
        }
    }

    pub fn screen(self, name: impl Into<String>, elements: Vec<FakeElement>) -> Self {
        self.state
            .lock()
            .unwrap()
            .screens
            .insert(name.into(), elements);
        self
    }

    /// Navigating to `url` lands on `screen`; unregistered urls land blank.
    pub fn on_navigate(self, url: impl Into<String>, screen: impl Into<String>) -> Self {
        self.state
            .lock()
            .unwrap()
            .landing
            .insert(url.into(), screen.into());
        self
    }

    /// Add a pre-existing tab besides the main one.
    pub fn with_extra_tab(self, handle: impl Into<String>, screen: impl Into<String>) -> Self {
        self.state
            .lock()
            .unwrap()
            .tabs
            .insert(handle.into(), screen.into());
        self
    }

    /// Every string typed into elements matching the locator, in order.
    pub fn typed_into(&self, locator: &Locator) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .typed
            .iter()
            .filter(|(l, _)| l == locator)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn current_tab(&self) -> String {
        self.state.lock().unwrap().current_tab.clone()
    }

    fn resolve(state: &FakeState, element: &ElementRef) -> Result<FakeElement, PageError> {
        let (screen, index) = state
            .refs
            .get(element.0 as usize)
            .cloned()
            .ok_or(PageError::StaleElement)?;
        let current_screen = state
            .tabs
            .get(&state.current_tab)
            .cloned()
            .unwrap_or_else(|| "blank".to_string());
        if screen != current_screen {
            return Err(PageError::StaleElement);
        }
        state
            .screens
            .get(&screen)
            .and_then(|elements| elements.get(index))
            .cloned()
            .ok_or(PageError::StaleElement)
    }

    fn apply(state: &mut FakeState, effect: &Effect) {
        match effect {
            Effect::None => {}
            Effect::GoTo(screen) => {
                let tab = state.current_tab.clone();
                state.tabs.insert(tab, screen.clone());
            }
            Effect::OpenTab { handle, screen } => {
                state.tabs.insert(handle.clone(), screen.clone());
            }
        }
    }
}

#[async_trait]
impl RemotePage for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        let screen = state
            .landing
            .get(url)
            .cloned()
            .unwrap_or_else(|| "blank".to_string());
        let tab = state.current_tab.clone();
        state.tabs.insert(tab, screen);
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>, PageError> {
        let mut state = self.state.lock().unwrap();
        let screen = state
            .tabs
            .get(&state.current_tab)
            .cloned()
            .unwrap_or_else(|| "blank".to_string());
        let indices: Vec<usize> = state
            .screens
            .get(&screen)
            .map(|elements| {
                elements
                    .iter()
                    .enumerate()
                    .filter(|(_, el)| el.locator == *locator)
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default();

        let mut found = Vec::with_capacity(indices.len());
        for index in indices {
            state.refs.push((screen.clone(), index));
            found.push(ElementRef((state.refs.len() - 1) as u64));
        }
        Ok(found)
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, PageError> {
        let state = self.state.lock().unwrap();
        Self::resolve(&state, element).map(|el| el.displayed)
    }

    async fn type_into(&self, element: &ElementRef, text: &str) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        let el = Self::resolve(&state, element)?;
        state.typed.push((el.locator.clone(), text.to_string()));
        Ok(())
    }

    async fn press_enter(&self, element: &ElementRef) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        let el = Self::resolve(&state, element)?;
        Self::apply(&mut state, &el.on_enter);
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        let el = Self::resolve(&state, element)?;
        Self::apply(&mut state, &el.on_click);
        Ok(())
    }

    async fn read_text(&self, element: &ElementRef) -> Result<String, PageError> {
        let state = self.state.lock().unwrap();
        Self::resolve(&state, element).map(|el| el.text)
    }

    async fn list_tabs(&self) -> Result<HashSet<TabHandle>, PageError> {
        let state = self.state.lock().unwrap();
        Ok(state.tabs.keys().map(|k| TabHandle(k.clone())).collect())
    }

    async fn switch_tab(&self, tab: &TabHandle) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        if state.tabs.contains_key(&tab.0) {
            state.current_tab = tab.0.clone();
            Ok(())
        } else {
            Err(PageError::Driver(anyhow!("no open tab named {}", tab.0)))
        }
    }
}

/// In-memory credential provider.
#[derive(Default)]
pub struct FakeVault {
    records: HashMap<String, Credentials>,
}

impl FakeVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site(self, site_id: &str, username: &str, password: &str) -> Self {
        self.with_answers(site_id, username, password, &[])
    }

    pub fn with_answers(
        mut self,
        site_id: &str,
        username: &str,
        password: &str,
        answers: &[(&str, &str)],
    ) -> Self {
        let answers: HashMap<String, String> = answers
            .iter()
            .map(|(q, a)| (q.to_string(), a.to_string()))
            .collect();
        self.records.insert(
            site_id.to_string(),
            Credentials::new(username, SecretString::from(password.to_string()), answers),
        );
        self
    }
}

#[async_trait]
impl CredentialProvider for FakeVault {
    async fn get_credentials(&self, site_id: &str) -> Result<Credentials, CredentialError> {
        self.records
            .get(site_id)
            .cloned()
            .ok_or_else(|| CredentialError::NotFound {
                site_id: site_id.to_string(),
            })
    }
}

/// Notifier that remembers everything it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Notifier whose channel is down.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _message: &str) -> anyhow::Result<()> {
        Err(anyhow!("smtp relay unreachable"))
    }
}
