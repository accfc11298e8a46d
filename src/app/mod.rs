use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::storage::NoteStore;
use crate::ui;
use crate::weather::{WeatherClient, WeatherEvent, WeatherRuntime};

pub mod state;

pub use state::{
    AppState, ConfirmDeleteOverlay, FocusPane, FormField, FormMode, FormState, OverlayState,
    WeatherOverlay,
};

enum Action {
    Quit,
    ToggleFocus,
    SelectNext,
    SelectPrevious,
    NewNote,
    EditNote,
    DeleteNote,
    DeleteAll,
    GrabOrDrop,
    StartSearch,
    CyclePriorityFilter,
    ResetFilters,
    OpenWeather,
}

pub struct App {
    pub config: Arc<AppConfig>,
    state: AppState,
    list_state: ListState,
    weather: WeatherRuntime,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, store: NoteStore) -> Result<Self> {
        let state = AppState::load(store, &config);
        let client =
            WeatherClient::new(&config.weather).context("building weather HTTP client")?;
        let weather = WeatherRuntime::new(client);
        let mut list_state = ListState::default();
        if state.visible_len() > 0 {
            list_state.select(Some(0));
        }
        Ok(Self {
            config,
            state,
            list_state,
            weather,
            should_quit: false,
            tick_rate: Duration::from_millis(150),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if self.state.visible_len() > 0 {
                        self.list_state.select(Some(self.state.selected));
                    } else {
                        self.list_state.select(None);
                    }
                    ui::draw_app(frame, &self.state, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // no-op: next draw adapts to the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        let Some(event) = self.weather.poll() else {
            return;
        };
        let Some(OverlayState::Weather(overlay)) = self.state.overlay.as_mut() else {
            return;
        };
        overlay.loading = false;
        match event {
            WeatherEvent::Report(report) => {
                overlay.error = None;
                overlay.report = Some(report);
            }
            WeatherEvent::Failed { .. } => {
                overlay.report = None;
                overlay.error = Some("Failed to fetch weather. Please try again.".to_string());
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        if self.state.search_active {
            match key.code {
                KeyCode::Esc => {
                    self.state.cancel_search();
                    return;
                }
                KeyCode::Enter => {
                    self.state.search_active = false;
                    return;
                }
                KeyCode::Backspace => {
                    self.state.pop_search_char();
                    return;
                }
                KeyCode::Char(ch) if plain(key) => {
                    self.state.push_search_char(ch);
                    return;
                }
                _ => {}
            }
        }

        if self.state.focus == FocusPane::Form && self.handle_form_key(key) {
            return;
        }

        let action = match key.code {
            KeyCode::Char('q') if self.state.focus == FocusPane::List => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Tab => Some(Action::ToggleFocus),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Char('n') if plain(key) => Some(Action::NewNote),
            KeyCode::Char('e') if plain(key) => Some(Action::EditNote),
            KeyCode::Char('d') if plain(key) => Some(Action::DeleteNote),
            KeyCode::Char('D') => Some(Action::DeleteAll),
            KeyCode::Char('m') if plain(key) => Some(Action::GrabOrDrop),
            KeyCode::Enter => Some(Action::GrabOrDrop),
            KeyCode::Char('/') if plain(key) => Some(Action::StartSearch),
            KeyCode::Char('f') if plain(key) => Some(Action::CyclePriorityFilter),
            KeyCode::Char('F') => Some(Action::ResetFilters),
            KeyCode::Char('w') if plain(key) => Some(Action::OpenWeather),
            KeyCode::Esc => {
                if self.state.move_source.take().is_some() {
                    self.state.set_status_message("Move canceled");
                }
                None
            }
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleFocus => {
                self.state.focus = match self.state.focus {
                    FocusPane::Form => FocusPane::List,
                    FocusPane::List => FocusPane::Form,
                };
            }
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::NewNote => {
                self.state.clear_form();
                self.state.focus = FocusPane::Form;
                self.state.set_status_message("Creating a new note.");
            }
            Action::EditNote => {
                if self.state.begin_edit_selected() {
                    self.state
                        .set_status_message("Editing note: Ctrl-s saves, Ctrl-l clears the form.");
                } else {
                    self.state.set_status_message("No note selected");
                }
            }
            Action::DeleteNote => self.request_delete_selected(),
            Action::DeleteAll => self.request_delete_all(),
            Action::GrabOrDrop => self.handle_grab_or_drop(),
            Action::StartSearch => {
                self.state.search_active = true;
                self.state.focus = FocusPane::List;
            }
            Action::CyclePriorityFilter => {
                self.state.cycle_priority_filter();
                self.state.set_status_message(format!(
                    "Priority filter: {}",
                    self.state.priority_filter().label()
                ));
            }
            Action::ResetFilters => {
                self.state.reset_filters();
                self.state.set_status_message("Filters cleared");
            }
            Action::OpenWeather => {
                self.state.overlay = Some(OverlayState::Weather(WeatherOverlay::default()));
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => {
                    if self.state.submit_form() {
                        self.state.set_status_message("Note saved");
                    }
                    return true;
                }
                KeyCode::Char('l') => {
                    self.state.clear_form();
                    self.state.set_status_message("Form cleared");
                    return true;
                }
                _ => return false,
            }
        }

        match key.code {
            KeyCode::Down => {
                self.state.form.active = self.state.form.active.next();
                true
            }
            KeyCode::Up => {
                self.state.form.active = self.state.form.active.previous();
                true
            }
            KeyCode::Enter => {
                match self.state.form.active {
                    FormField::Content => {
                        self.state.form.content.push('\n');
                    }
                    FormField::Priority => {
                        if self.state.submit_form() {
                            self.state.set_status_message("Note saved");
                        }
                    }
                    _ => {
                        self.state.form.active = self.state.form.active.next();
                    }
                }
                true
            }
            KeyCode::Backspace => {
                if let Some(input) = self.state.form.active_input_mut() {
                    input.pop();
                }
                true
            }
            KeyCode::Left | KeyCode::Right if self.state.form.active == FormField::Priority => {
                self.state.form.cycle_priority();
                true
            }
            KeyCode::Char(' ') if self.state.form.active == FormField::Priority => {
                self.state.form.cycle_priority();
                true
            }
            KeyCode::Char(ch) if plain(key) => {
                if let Some(input) = self.state.form.active_input_mut() {
                    input.push(ch);
                }
                true
            }
            KeyCode::Esc => {
                self.state.focus = FocusPane::List;
                true
            }
            _ => false,
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        match self.state.overlay.clone() {
            Some(OverlayState::ConfirmDelete(confirm)) => {
                match key.code {
                    KeyCode::Esc | KeyCode::Char('n') => {
                        self.state.overlay = None;
                        self.state.set_status_message("Delete canceled");
                    }
                    KeyCode::Enter | KeyCode::Char('y') => {
                        self.state.overlay = None;
                        if self.state.delete_note(&confirm.note_id) {
                            self.state
                                .set_status_message(format!("Deleted '{}'", confirm.title));
                        }
                    }
                    _ => {}
                }
                true
            }
            Some(OverlayState::ConfirmDeleteAll) => {
                match key.code {
                    KeyCode::Esc | KeyCode::Char('n') => {
                        self.state.overlay = None;
                        self.state.set_status_message("Delete canceled");
                    }
                    KeyCode::Enter | KeyCode::Char('y') => {
                        self.state.overlay = None;
                        let dropped = self.state.delete_all();
                        self.state
                            .set_status_message(format!("Deleted {dropped} note(s)"));
                    }
                    _ => {}
                }
                true
            }
            Some(OverlayState::Weather(_)) => {
                match key.code {
                    KeyCode::Esc => {
                        self.state.overlay = None;
                    }
                    KeyCode::Enter => self.submit_weather_search(),
                    KeyCode::Backspace => {
                        if let Some(OverlayState::Weather(overlay)) = self.state.overlay.as_mut() {
                            overlay.city_input.pop();
                        }
                    }
                    KeyCode::Char(ch) if plain(key) => {
                        if let Some(OverlayState::Weather(overlay)) = self.state.overlay.as_mut() {
                            overlay.city_input.push(ch);
                        }
                    }
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    fn submit_weather_search(&mut self) {
        let Some(OverlayState::Weather(overlay)) = self.state.overlay.as_mut() else {
            return;
        };
        let city_input = overlay.city_input.clone();
        match self.weather.request(&city_input) {
            Ok(()) => {
                overlay.loading = true;
                overlay.error = None;
                overlay.report = None;
            }
            Err(err) => {
                overlay.loading = false;
                overlay.report = None;
                overlay.error = Some(err.to_string());
            }
        }
    }

    fn request_delete_selected(&mut self) {
        if self.state.overlay.is_some() {
            return;
        }
        let Some(note) = self.state.selected_note() else {
            self.state.set_status_message("No note selected");
            return;
        };
        self.state.overlay = Some(OverlayState::ConfirmDelete(ConfirmDeleteOverlay {
            note_id: note.id.clone(),
            title: note.title.clone(),
        }));
    }

    fn request_delete_all(&mut self) {
        if self.state.overlay.is_some() {
            return;
        }
        if self.state.book().is_empty() {
            // Nothing to confirm; bulk delete of an empty list is a no-op.
            return;
        }
        self.state.overlay = Some(OverlayState::ConfirmDeleteAll);
    }

    fn handle_grab_or_drop(&mut self) {
        if self.state.focus != FocusPane::List {
            return;
        }
        if self.state.move_source.is_some() {
            if self.state.drop_grabbed_on_selected() {
                self.state.set_status_message("Note moved");
            } else {
                self.state.set_status_message("Move canceled");
            }
            return;
        }
        let Some(note) = self.state.selected_note() else {
            self.state.set_status_message("No note selected");
            return;
        };
        let title = note.title.clone();
        self.state.move_source = Some(note.id.clone());
        self.state.set_status_message(format!(
            "Moving '{title}': j/k to pick a target, Enter to drop before it, Esc cancels."
        ));
    }
}

fn plain(key: KeyEvent) -> bool {
    !key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
