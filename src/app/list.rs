use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::SortMode;
use crate::storage::{Note, Priority};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    Continue,
    Quit,
    Add,
    View(String),
    Edit(String),
    Delete(String),
    SetPriority(String, Priority),
    ToggleObscured(String),
    /// Sort mode changed; the caller re-sorts.
    Resort,
}

/// Selection and ordering for the note list.
#[derive(Debug, Clone, Default)]
pub struct ListNavigator {
    selected: usize,
    sort_mode: SortMode,
}

impl ListNavigator {
    pub fn new(sort_mode: SortMode) -> Self {
        Self {
            selected: 0,
            sort_mode,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn move_selection(&mut self, delta: isize, count: usize) {
        if count == 0 {
            self.selected = 0;
            return;
        }
        let max = count as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, max) as usize;
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self, count: usize) {
        self.selected = count.saturating_sub(1);
    }

    pub fn select_index(&mut self, index: usize, count: usize) {
        self.selected = index.min(count.saturating_sub(1));
    }

    pub fn normalize(&mut self, count: usize) {
        self.select_index(self.selected, count);
    }

    /// Advance the sort mode and go back to the top of the list.
    pub fn cycle_sort(&mut self) -> SortMode {
        self.sort_mode = self.sort_mode.next();
        self.selected = 0;
        self.sort_mode
    }

    /// `notes` must already be in display order.
    pub fn handle_key(&mut self, key: KeyEvent, notes: &[Note]) -> ListOutcome {
        let count = notes.len();
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => ListOutcome::Quit,
                _ => ListOutcome::Continue,
            };
        }
        if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER) {
            return ListOutcome::Continue;
        }
        let selected_id = notes.get(self.selected).map(|note| note.id.clone());
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => ListOutcome::Quit,
            KeyCode::Char('a') | KeyCode::Char('i') => ListOutcome::Add,
            KeyCode::Char('s') => {
                self.cycle_sort();
                ListOutcome::Resort
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1, count);
                ListOutcome::Continue
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1, count);
                ListOutcome::Continue
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.select_first();
                ListOutcome::Continue
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.select_last(count);
                ListOutcome::Continue
            }
            KeyCode::Enter => selected_id.map_or(ListOutcome::Continue, ListOutcome::View),
            KeyCode::Char('e') => selected_id.map_or(ListOutcome::Continue, ListOutcome::Edit),
            KeyCode::Char('d') | KeyCode::Delete => {
                selected_id.map_or(ListOutcome::Continue, ListOutcome::Delete)
            }
            KeyCode::Char('x') => {
                selected_id.map_or(ListOutcome::Continue, ListOutcome::ToggleObscured)
            }
            KeyCode::Char(digit @ '1'..='4') => {
                let priority = match digit {
                    '1' => Priority::High,
                    '2' => Priority::Medium,
                    '3' => Priority::Low,
                    _ => Priority::None,
                };
                selected_id.map_or(ListOutcome::Continue, |id| {
                    ListOutcome::SetPriority(id, priority)
                })
            }
            _ => ListOutcome::Continue,
        }
    }
}

/// Stable sort of a copy of `notes`; ties keep their stored order.
pub fn sort_notes(notes: &[Note], mode: SortMode) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    match mode {
        SortMode::PriorityAsc => sorted.sort_by_key(|note| note.priority.rank()),
        SortMode::PriorityDesc => {
            sorted.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()))
        }
        SortMode::DateAsc => sorted.sort_by_key(|note| note.created_at),
        SortMode::DateDesc => sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    sorted
}

/// Rows available to the list on a terminal `height` rows tall.
pub fn visible_rows(height: u16, chrome_rows: u16) -> usize {
    usize::from(height.saturating_sub(chrome_rows)).max(1)
}

/// First row to draw so the selection sits near the middle of the window.
pub fn scroll_offset(selected: usize, count: usize, visible: usize) -> usize {
    let visible = visible.max(1);
    let max_offset = count.saturating_sub(visible);
    selected.saturating_sub(visible / 2).min(max_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime};

    fn note(id: &str, priority: Priority, age_days: i64) -> Note {
        let created = OffsetDateTime::UNIX_EPOCH + Duration::days(1_000 - age_days);
        Note {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: format!("content of {id}"),
            priority,
            links: Vec::new(),
            obscured: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|note| note.id.as_str()).collect()
    }

    fn sample() -> Vec<Note> {
        vec![
            note("a", Priority::Low, 5),
            note("b", Priority::High, 1),
            note("c", Priority::None, 9),
            note("d", Priority::High, 3),
            note("e", Priority::Medium, 7),
        ]
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn priority_sort_is_stable() {
        let notes = sample();
        let asc = sort_notes(&notes, SortMode::PriorityAsc);
        assert_eq!(ids(&asc), ["b", "d", "e", "a", "c"]);
        let desc = sort_notes(&notes, SortMode::PriorityDesc);
        assert_eq!(ids(&desc), ["c", "a", "e", "b", "d"]);
        assert_eq!(sort_notes(&asc, SortMode::PriorityAsc), asc);
    }

    #[test]
    fn date_sort_uses_creation_time() {
        let notes = sample();
        assert_eq!(
            ids(&sort_notes(&notes, SortMode::DateAsc)),
            ["c", "e", "a", "d", "b"]
        );
        assert_eq!(
            ids(&sort_notes(&notes, SortMode::DateDesc)),
            ["b", "d", "a", "e", "c"]
        );
    }

    #[test]
    fn selection_clamps_to_collection() {
        let notes = sample();
        let mut nav = ListNavigator::default();
        nav.handle_key(key(KeyCode::Up), &notes);
        assert_eq!(nav.selected(), 0);
        for _ in 0..10 {
            nav.handle_key(key(KeyCode::Char('j')), &notes);
        }
        assert_eq!(nav.selected(), 4);
        nav.handle_key(key(KeyCode::Char('g')), &notes);
        assert_eq!(nav.selected(), 0);
        nav.handle_key(key(KeyCode::Char('G')), &notes);
        assert_eq!(nav.selected(), 4);
        nav.normalize(2);
        assert_eq!(nav.selected(), 1);
        nav.normalize(0);
        assert_eq!(nav.selected(), 0);
    }

    #[test]
    fn sort_key_cycles_and_resets_selection() {
        let notes = sample();
        let mut nav = ListNavigator::new(SortMode::PriorityAsc);
        nav.select_last(notes.len());
        assert_eq!(nav.handle_key(key(KeyCode::Char('s')), &notes), ListOutcome::Resort);
        assert_eq!(nav.sort_mode(), SortMode::PriorityDesc);
        assert_eq!(nav.selected(), 0);
        for _ in 0..3 {
            nav.cycle_sort();
        }
        assert_eq!(nav.sort_mode(), SortMode::PriorityAsc);
    }

    #[test]
    fn actions_target_the_selected_note() {
        let notes = sample();
        let mut nav = ListNavigator::default();
        nav.handle_key(key(KeyCode::Down), &notes);
        assert_eq!(
            nav.handle_key(key(KeyCode::Enter), &notes),
            ListOutcome::View("b".to_string())
        );
        assert_eq!(
            nav.handle_key(key(KeyCode::Char('e')), &notes),
            ListOutcome::Edit("b".to_string())
        );
        assert_eq!(
            nav.handle_key(key(KeyCode::Char('3')), &notes),
            ListOutcome::SetPriority("b".to_string(), Priority::Low)
        );
        assert_eq!(
            nav.handle_key(key(KeyCode::Char('d')), &notes),
            ListOutcome::Delete("b".to_string())
        );
    }

    #[test]
    fn empty_list_only_offers_add_and_quit() {
        let mut nav = ListNavigator::default();
        assert_eq!(nav.handle_key(key(KeyCode::Enter), &[]), ListOutcome::Continue);
        assert_eq!(nav.handle_key(key(KeyCode::Char('1')), &[]), ListOutcome::Continue);
        assert_eq!(nav.handle_key(key(KeyCode::Char('i')), &[]), ListOutcome::Add);
        assert_eq!(nav.handle_key(key(KeyCode::Char('q')), &[]), ListOutcome::Quit);
        assert_eq!(
            nav.handle_key(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &[]
            ),
            ListOutcome::Quit
        );
    }

    #[test]
    fn scroll_window_centres_selection() {
        assert_eq!(visible_rows(30, 6), 24);
        assert_eq!(visible_rows(5, 6), 1);
        assert_eq!(scroll_offset(0, 50, 10), 0);
        assert_eq!(scroll_offset(4, 50, 10), 0);
        assert_eq!(scroll_offset(20, 50, 10), 15);
        assert_eq!(scroll_offset(49, 50, 10), 40);
        assert_eq!(scroll_offset(3, 5, 10), 0);
        assert_eq!(scroll_offset(7, 8, 1), 7);
    }
}
