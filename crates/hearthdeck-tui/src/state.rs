//! App state and the single dispatch path for every input event.
//!
//! Keystrokes resolve to a typed `UiAction` through one `(focus, key)`
//! table, except while a chord is in flight, in which case every
//! character keystroke feeds the chord machine. Hub traffic arrives as
//! `HubEvent`s and is applied here; nothing else touches the tree, the
//! chord state, or the log.

use crossterm::event::{KeyCode, KeyEvent};
use hearthdeck_core::chords::{ChordGrammar, ChordState};
use hearthdeck_core::entities::{EntityTree, NodeId};
use hearthdeck_core::wire::{Command, Event};
use hearthdeck_core::Config;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::warn;

use crate::hub::HubEvent;

const LOG_DUMP_FILE: &str = "hearthdeck_log.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Switches,
    Logs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Quit,
    FocusSwitches,
    FocusLogs,
    MoveDown,
    MoveUp,
    Tree(char),
    ToggleEntity,
    RefreshStates,
    NodeInfo,
    ClearLog,
    DumpLog,
    ChordKey(char),
}

/// The keystroke dispatch table. Direct bindings win over chord
/// starters; a character that is neither returns `None`.
pub fn action_for(focus: Focus, key: char, grammar: &ChordGrammar) -> Option<UiAction> {
    match key {
        'q' => return Some(UiAction::Quit),
        '[' => return Some(UiAction::FocusSwitches),
        ']' => return Some(UiAction::FocusLogs),
        _ => {}
    }
    match focus {
        Focus::Switches => match key {
            'j' => Some(UiAction::MoveDown),
            'k' => Some(UiAction::MoveUp),
            'h' | 'l' | 'H' | 'L' => Some(UiAction::Tree(key)),
            ';' => Some(UiAction::ToggleEntity),
            'r' => Some(UiAction::RefreshStates),
            'i' => Some(UiAction::NodeInfo),
            key if grammar.has_nomen(key) => Some(UiAction::ChordKey(key)),
            _ => None,
        },
        Focus::Logs => match key {
            'j' => Some(UiAction::MoveDown),
            'k' => Some(UiAction::MoveUp),
            'd' => Some(UiAction::ClearLog),
            'w' => Some(UiAction::DumpLog),
            _ => None,
        },
    }
}

pub struct App {
    pub grammar: ChordGrammar,
    pub chord: ChordState,
    pub tree: EntityTree,
    pub selection: NodeId,
    pub focus: Focus,
    pub connected: bool,
    pub status: String,
    pub log: Vec<String>,
    /// Lines scrolled back from the log tail; 0 follows new entries.
    pub log_offset: usize,
    pub should_quit: bool,
    pub log_dump_path: PathBuf,
    command_tx: mpsc::UnboundedSender<Command>,
}

impl App {
    pub fn new(config: &Config, command_tx: mpsc::UnboundedSender<Command>) -> Self {
        let tree = EntityTree::build(&config.entities);
        let selection = tree.first_selectable();
        Self {
            grammar: config.grammar(),
            chord: ChordState::new(),
            tree,
            selection,
            focus: Focus::Switches,
            connected: false,
            status: String::new(),
            log: Vec::new(),
            log_offset: 0,
            should_quit: false,
            log_dump_path: PathBuf::from(LOG_DUMP_FILE),
            command_tx,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.chord.reset();
                return;
            }
            KeyCode::Down => {
                self.apply(UiAction::MoveDown);
                return;
            }
            KeyCode::Up => {
                self.apply(UiAction::MoveUp);
                return;
            }
            _ => {}
        }
        let KeyCode::Char(key) = key.code else {
            return;
        };
        if self.chord.active {
            self.feed_chord(key);
            return;
        }
        if let Some(action) = action_for(self.focus, key, &self.grammar) {
            self.apply(action);
        }
    }

    pub fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Quit => self.should_quit = true,
            UiAction::FocusSwitches => self.focus = Focus::Switches,
            UiAction::FocusLogs => self.focus = Focus::Logs,
            UiAction::MoveDown => match self.focus {
                Focus::Switches => {
                    self.selection = self.tree.move_selection(self.selection, 1);
                }
                Focus::Logs => self.log_offset = self.log_offset.saturating_sub(1),
            },
            UiAction::MoveUp => match self.focus {
                Focus::Switches => {
                    self.selection = self.tree.move_selection(self.selection, -1);
                }
                Focus::Logs => {
                    self.log_offset = (self.log_offset + 1).min(self.log.len());
                }
            },
            UiAction::Tree(key) => {
                self.selection = self.tree.vi_navigate(self.selection, key);
            }
            UiAction::ToggleEntity => self.toggle_selected(),
            UiAction::RefreshStates => {
                self.send_command(Command::get_states());
                self.status = "refreshing states".to_string();
            }
            UiAction::NodeInfo => self.node_info(),
            UiAction::ClearLog => {
                self.log.clear();
                self.log_offset = 0;
            }
            UiAction::DumpLog => self.dump_log(),
            UiAction::ChordKey(key) => self.feed_chord(key),
        }
    }

    fn feed_chord(&mut self, key: char) {
        if let Err(err) = self.chord.consume(key, &self.grammar) {
            self.status = err.to_string();
            return;
        }
        if let Some(action) = self.chord.take_action() {
            self.dispatch_chord_action(action);
        }
    }

    /// The first `:`-segment of a resolved chord action is the service
    /// to call on the selected entity; the full action is surfaced in
    /// the status pane.
    fn dispatch_chord_action(&mut self, action: String) {
        let service = action.split(':').next().unwrap_or("").to_string();
        match self.selected_entity() {
            Some(entity_id) if !service.is_empty() => {
                self.send_command(Command::call_service(entity_id, service));
                self.status = action;
            }
            Some(_) => self.status = action,
            None => self.status = format!("no entity selected for {action}"),
        }
    }

    fn selected_entity(&self) -> Option<String> {
        self.tree.entity_id(self.selection).map(str::to_string)
    }

    fn toggle_selected(&mut self) {
        match self.selected_entity() {
            Some(entity_id) => {
                self.send_command(Command::toggle(&entity_id));
                self.status = format!("toggle {entity_id}");
            }
            None => self.status = "no entity selected".to_string(),
        }
    }

    fn node_info(&mut self) {
        let current = self.tree.node(self.selection).label.clone();
        match self.tree.find_parent(self.selection, self.tree.root()) {
            Some(parent) => {
                let parent = self.tree.node(parent).label.clone();
                self.status = format!("parent: {parent}\ncurrent: {current}");
            }
            None => self.status = format!("no parent found\ncurrent: {current}"),
        }
    }

    fn send_command(&mut self, command: Command) {
        if self.command_tx.send(command).is_err() {
            warn!("command_channel_closed");
            self.status = "hub channel closed".to_string();
        }
    }

    pub fn apply_hub_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::Connected => {
                self.connected = true;
                self.status = "hub connected".to_string();
                self.send_command(Command::get_states());
            }
            HubEvent::Disconnected => {
                self.connected = false;
                self.status = "hub disconnected, retrying".to_string();
            }
            HubEvent::SendFailed(detail) => {
                self.status = format!("command dropped: {detail}");
            }
            HubEvent::Inbound { event, pretty } => {
                match event {
                    Event::StateChanged {
                        entity_id,
                        new_state,
                        ..
                    } => {
                        self.tree.apply_state_changed(&entity_id, &new_state);
                    }
                    Event::StatesResult(states) => {
                        self.tree.apply_states_result(
                            states
                                .iter()
                                .map(|state| (state.entity_id.as_str(), state.state.as_str())),
                        );
                    }
                    Event::Other(_) => {}
                }
                self.log.push(pretty);
            }
        }
    }

    fn dump_log(&mut self) {
        match std::fs::write(&self.log_dump_path, self.log.join(",\n")) {
            Ok(()) => {
                self.status = format!("log written to {}", self.log_dump_path.display());
            }
            Err(err) => self.status = format!("log write failed: {err}"),
        }
    }
}
