//! Thread-shareable handle around a `PanStrategy`.
//!
//! No engine operation is safe to interrupt halfway (the wrap pass rewinds
//! its input index), so each public call runs under one lock acquisition.
//! A poisoned lock is recovered rather than surfaced; the state is replaced
//! wholesale by the next `set_content`.

use std::sync::{Arc, Mutex, MutexGuard};

use core_cells::Cell;

use crate::{CursorRange, PanMode, PanStrategy, SliceOffsets, Viewport};

#[derive(Debug, Clone, Default)]
pub struct SharedPanStrategy {
    inner: Arc<Mutex<PanStrategy>>,
}

impl SharedPanStrategy {
    pub fn new(pan: PanStrategy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pan)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanStrategy> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run several operations as one critical section.
    pub fn with<R>(&self, f: impl FnOnce(&mut PanStrategy) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn set_display_size(&self, rows: usize, columns: usize) {
        self.lock().set_display_size(rows, columns);
    }

    pub fn set_pan_strategy(&self, wrapped: bool) {
        self.lock().set_pan_strategy(wrapped);
    }

    pub fn set_content(
        &self,
        text: impl Into<String>,
        cells: Vec<Cell>,
        cell_to_text: Vec<usize>,
        target_position: usize,
    ) {
        self.lock()
            .set_content(text, cells, cell_to_text, target_position);
    }

    pub fn set_cursor(&self, start: isize, end: isize) {
        self.lock().set_cursor(start, end);
    }

    pub fn cursor(&self) -> CursorRange {
        self.lock().cursor()
    }

    pub fn next(&self) -> bool {
        self.lock().next()
    }

    pub fn previous(&self) -> bool {
        self.lock().previous()
    }

    pub fn pan_to_position(&self, position: usize) {
        self.lock().pan_to_position(position);
    }

    pub fn current_braille_viewport_contents(&self, show_cursor: bool) -> Vec<Cell> {
        self.lock().current_braille_viewport_contents(show_cursor)
    }

    pub fn current_text_viewport_contents(&self) -> String {
        self.lock().current_text_viewport_contents()
    }

    pub fn offsets_for_slices(&self) -> SliceOffsets {
        self.lock().offsets_for_slices()
    }

    pub fn viewport(&self) -> Viewport {
        self.lock().viewport()
    }

    pub fn mode(&self) -> PanMode {
        self.lock().mode()
    }
}
