//! The authoritative editor state.
//!
//! Every mutation is applied to memory first and then written to the
//! datastore, either right away (create, delete, reorder) or through the
//! keyed debouncer (content, position and size edits). Datastore failures are
//! logged and never roll back local state. Undo and redo are local only.
//!
//! Methods that schedule writes must be called from within a Tokio runtime.

use crate::{
    config::EditorConfig,
    debounce::{DebounceKey, Debouncer},
    history::{History, Snapshot},
    model::{Element, ElementKind, ElementPatch, Section, SectionKind, SectionPatch},
    persistence::EditorPersistence,
    templates::section_template,
};
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

struct EditorState {
    sections: Snapshot,
    selected_section: Option<Uuid>,
    selected_element: Option<Uuid>,
    history: History,
}

impl EditorState {
    fn section_index(&self, id: Uuid) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    fn element_index(&self, id: Uuid) -> Option<(usize, usize)> {
        self.sections.iter().enumerate().find_map(|(si, s)| {
            s.elements
                .iter()
                .position(|e| e.id == id)
                .map(|ei| (si, ei))
        })
    }

    fn save_history(&mut self) {
        self.history.save(&self.sections);
    }

    /// Drops selections that point at entities no longer present.
    fn repair_selection(&mut self) {
        if let Some(id) = self.selected_section {
            if self.section_index(id).is_none() {
                self.selected_section = None;
            }
        }
        if let Some(id) = self.selected_element {
            if self.element_index(id).is_none() {
                self.selected_element = None;
            }
        }
    }
}

/// Renumbers `order_index` to 0..n, touching only sections that change.
fn reindex_sections(sections: &mut [Arc<Section>]) {
    for (i, s) in sections.iter_mut().enumerate() {
        if s.order_index != i as u32 {
            Arc::make_mut(s).order_index = i as u32;
        }
    }
}

pub struct EditorStore {
    config: EditorConfig,
    state: RwLock<EditorState>,
    persistence: Arc<dyn EditorPersistence>,
    debouncer: Debouncer,
}

impl EditorStore {
    pub fn new(config: EditorConfig, persistence: Arc<dyn EditorPersistence>) -> Self {
        let history = History::new(config.history_limit);
        let debouncer = Debouncer::new(config.debounce);
        Self {
            config,
            state: RwLock::new(EditorState {
                sections: Vec::new(),
                selected_section: None,
                selected_element: None,
                history,
            }),
            persistence,
            debouncer,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Replaces local state with the page's sections from the datastore and
    /// resets history and selection.
    pub async fn load(&self) -> anyhow::Result<usize> {
        let mut sections = self.persistence.fetch_sections(self.config.page_id).await?;
        sections.sort_by_key(|s| s.order_index);

        let mut sections: Snapshot = sections
            .into_iter()
            .map(|mut s| {
                s.reindex_elements();
                Arc::new(s)
            })
            .collect();
        reindex_sections(&mut sections);

        let n = sections.len();
        let mut st = self.state.write();
        st.sections = sections;
        st.selected_section = None;
        st.selected_element = None;
        st.history.clear();
        tracing::info!(page_id = %self.config.page_id, sections = n, "editor state loaded");
        Ok(n)
    }

    // --- queries ---

    pub fn sections(&self) -> Snapshot {
        self.state.read().sections.clone()
    }

    pub fn section(&self, id: Uuid) -> Option<Arc<Section>> {
        let st = self.state.read();
        st.section_index(id).map(|i| Arc::clone(&st.sections[i]))
    }

    pub fn element(&self, id: Uuid) -> Option<Element> {
        let st = self.state.read();
        st.element_index(id)
            .map(|(si, ei)| st.sections[si].elements[ei].clone())
    }

    pub fn selected_section(&self) -> Option<Uuid> {
        self.state.read().selected_section
    }

    pub fn selected_element(&self) -> Option<Uuid> {
        self.state.read().selected_element
    }

    pub fn can_undo(&self) -> bool {
        self.state.read().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.read().history.can_redo()
    }

    /// `(undo depth, redo depth)`.
    pub fn history_depth(&self) -> (usize, usize) {
        let st = self.state.read();
        (st.history.past_len(), st.history.future_len())
    }

    pub fn pending_writes(&self) -> usize {
        self.debouncer.pending()
    }

    // --- selection ---

    /// Selects a section (or clears with `None`). Clears the element selection.
    pub fn select_section(&self, id: Option<Uuid>) -> bool {
        let mut st = self.state.write();
        if let Some(id) = id {
            if st.section_index(id).is_none() {
                return false;
            }
        }
        st.selected_section = id;
        st.selected_element = None;
        true
    }

    /// Selects an element and its parent section.
    pub fn select_element(&self, id: Option<Uuid>) -> bool {
        let mut st = self.state.write();
        match id {
            None => {
                st.selected_element = None;
                true
            }
            Some(id) => match st.element_index(id) {
                Some((si, _)) => {
                    st.selected_section = Some(st.sections[si].id);
                    st.selected_element = Some(id);
                    true
                }
                None => false,
            },
        }
    }

    // --- sections ---

    /// Inserts a section built from its kind's template at `index` (append
    /// when `None` or out of range) and selects it. Returns the section id,
    /// which is the datastore's id when the create succeeded.
    pub async fn add_section(&self, kind: SectionKind, index: Option<usize>) -> Uuid {
        let local_id = Uuid::new_v4();
        let template = section_template(kind);

        let (row, shifted) = {
            let mut guard = self.state.write();
            let st = &mut *guard;
            st.save_history();

            let len = st.sections.len();
            let at = index.unwrap_or(len).min(len);
            st.sections.insert(
                at,
                Arc::new(Section {
                    id: local_id,
                    page_id: self.config.page_id,
                    kind,
                    order_index: at as u32,
                    config: template.config,
                    background: template.background,
                    min_height: template.min_height,
                    elements: Vec::new(),
                }),
            );
            reindex_sections(&mut st.sections);
            st.selected_section = Some(local_id);
            st.selected_element = None;

            ((*st.sections[at]).clone(), at < len)
        };

        let id = match self.persistence.create_section(row).await {
            Ok(Some(saved)) => {
                if saved.id != local_id {
                    self.replace_section_id(local_id, saved.id);
                }
                saved.id
            }
            Ok(None) => {
                tracing::warn!(section_id = %local_id, "section not stored, keeping local id");
                local_id
            }
            Err(e) => {
                tracing::warn!(section_id = %local_id, error = %e, "section create failed, keeping local id");
                local_id
            }
        };

        if shifted {
            self.persist_order().await;
        }
        id
    }

    fn replace_section_id(&self, from: Uuid, to: Uuid) {
        let mut guard = self.state.write();
        let st = &mut *guard;
        if let Some(i) = st.section_index(from) {
            let section = Arc::make_mut(&mut st.sections[i]);
            section.id = to;
            for e in &mut section.elements {
                e.section_id = to;
            }
        }
        if st.selected_section == Some(from) {
            st.selected_section = Some(to);
        }
    }

    /// Applies `patch` now and schedules a debounced write of the section.
    pub fn update_section(&self, id: Uuid, patch: SectionPatch) -> bool {
        if patch.is_empty() {
            return false;
        }

        let full = {
            let mut guard = self.state.write();
            let st = &mut *guard;
            let Some(i) = st.section_index(id) else {
                return false;
            };
            st.save_history();
            let section = Arc::make_mut(&mut st.sections[i]);
            patch.apply(section);
            SectionPatch::full(section)
        };

        self.persist_section_later(id, full);
        true
    }

    pub async fn remove_section(&self, id: Uuid) -> bool {
        let (removed, was_last) = {
            let mut guard = self.state.write();
            let st = &mut *guard;
            let Some(i) = st.section_index(id) else {
                return false;
            };
            st.save_history();
            let removed = st.sections.remove(i);
            reindex_sections(&mut st.sections);
            st.repair_selection();
            (removed, i == st.sections.len())
        };

        self.debouncer.cancel_entity(id);
        for e in &removed.elements {
            self.debouncer.cancel_entity(e.id);
        }

        if let Err(e) = self.persistence.delete_section(id).await {
            tracing::warn!(section_id = %id, error = %e, "section delete not persisted");
        }
        if !was_last {
            self.persist_order().await;
        }
        true
    }

    /// Moves the section at `from` to `to` and persists the full order.
    pub async fn reorder_sections(&self, from: usize, to: usize) -> bool {
        {
            let mut guard = self.state.write();
            let st = &mut *guard;
            let len = st.sections.len();
            if from >= len || to >= len || from == to {
                return false;
            }
            st.save_history();
            let section = st.sections.remove(from);
            st.sections.insert(to, section);
            reindex_sections(&mut st.sections);
        }

        self.persist_order().await;
        true
    }

    async fn persist_order(&self) {
        let order: Vec<Uuid> = self.state.read().sections.iter().map(|s| s.id).collect();
        if let Err(e) = self
            .persistence
            .reorder_sections(self.config.page_id, order)
            .await
        {
            tracing::warn!(page_id = %self.config.page_id, error = %e, "section order not persisted");
        }
    }

    // --- elements ---

    /// Places a new element at the snapped `(x, y)` on top of its siblings
    /// and selects it.
    pub async fn add_element(
        &self,
        section_id: Uuid,
        kind: ElementKind,
        x: f64,
        y: f64,
    ) -> Option<Uuid> {
        let local_id = Uuid::new_v4();
        let (width, height) = kind.default_size();

        let row = {
            let mut guard = self.state.write();
            let st = &mut *guard;
            let si = st.section_index(section_id)?;
            st.save_history();

            let section = Arc::make_mut(&mut st.sections[si]);
            let element = Element {
                id: local_id,
                section_id,
                kind,
                x: self.config.snap(x),
                y: self.config.snap(y),
                width,
                height,
                content: kind.default_content(),
                z_index: section.elements.len() as u32,
            };
            section.elements.push(element.clone());
            st.selected_section = Some(section_id);
            st.selected_element = Some(local_id);
            element
        };

        let id = match self.persistence.create_element(row).await {
            Ok(Some(saved)) => {
                if saved.id != local_id {
                    self.replace_element_id(local_id, saved.id);
                }
                saved.id
            }
            Ok(None) => {
                tracing::warn!(element_id = %local_id, "element not stored, keeping local id");
                local_id
            }
            Err(e) => {
                tracing::warn!(element_id = %local_id, error = %e, "element create failed, keeping local id");
                local_id
            }
        };
        Some(id)
    }

    fn replace_element_id(&self, from: Uuid, to: Uuid) {
        let mut guard = self.state.write();
        let st = &mut *guard;
        if let Some((si, ei)) = st.element_index(from) {
            Arc::make_mut(&mut st.sections[si]).elements[ei].id = to;
        }
        if st.selected_element == Some(from) {
            st.selected_element = Some(to);
        }
    }

    /// Applies `patch` now and schedules a debounced write of the element.
    /// Stacking order is owned by the store, so `patch.z_index` is ignored.
    pub fn update_element(&self, id: Uuid, patch: ElementPatch) -> bool {
        let patch = ElementPatch {
            z_index: None,
            ..patch
        };
        if patch.is_empty() {
            return false;
        }

        let full = match self.edit_element(id, |e| patch.apply(e)) {
            Some(e) => ElementPatch::full(&e),
            None => return false,
        };
        self.persist_element_later(DebounceKey::Element(id), id, full);
        true
    }

    /// Moves an element to the grid point nearest `(x, y)`.
    pub fn move_element(&self, id: Uuid, x: f64, y: f64) -> bool {
        let (x, y) = (self.config.snap(x), self.config.snap(y));
        match self.element(id) {
            Some(e) if e.x == x && e.y == y => return false,
            Some(_) => {}
            None => return false,
        }

        if self.edit_element(id, |e| {
            e.x = x;
            e.y = y;
        })
        .is_none()
        {
            return false;
        }
        self.persist_element_later(
            DebounceKey::ElementPosition(id),
            id,
            ElementPatch::position(x, y),
        );
        true
    }

    /// Resizes an element to the snapped size, never below one grid step.
    pub fn resize_element(&self, id: Uuid, width: f64, height: f64) -> bool {
        let min = self.config.grid_size.max(1) as f64;
        let width = self.config.snap(width).max(min);
        let height = self.config.snap(height).max(min);
        match self.element(id) {
            Some(e) if e.width == width && e.height == height => return false,
            Some(_) => {}
            None => return false,
        }

        if self.edit_element(id, |e| {
            e.width = width;
            e.height = height;
        })
        .is_none()
        {
            return false;
        }
        self.persist_element_later(
            DebounceKey::ElementSize(id),
            id,
            ElementPatch::size(width, height),
        );
        true
    }

    pub async fn remove_element(&self, id: Uuid) -> bool {
        let restacked = {
            let mut guard = self.state.write();
            let st = &mut *guard;
            let Some((si, ei)) = st.element_index(id) else {
                return false;
            };
            st.save_history();

            let section = Arc::make_mut(&mut st.sections[si]);
            section.elements.remove(ei);
            let before: Vec<(Uuid, u32)> =
                section.elements.iter().map(|e| (e.id, e.z_index)).collect();
            section.reindex_elements();
            let restacked = changed_elements(section, &before);
            st.repair_selection();
            restacked
        };

        self.debouncer.cancel_entity(id);
        if let Err(e) = self.persistence.delete_element(id).await {
            tracing::warn!(element_id = %id, error = %e, "element delete not persisted");
        }
        for e in restacked {
            self.persist_element_later(DebounceKey::Element(e.id), e.id, ElementPatch::full(&e));
        }
        true
    }

    /// Puts the element above all its siblings; z indices stay 0..n.
    pub fn bring_element_to_front(&self, id: Uuid) -> bool {
        let restacked = {
            let mut guard = self.state.write();
            let st = &mut *guard;
            let Some((si, ei)) = st.element_index(id) else {
                return false;
            };
            let top = st.sections[si].elements.len() as u32 - 1;
            if st.sections[si].elements[ei].z_index == top {
                return false;
            }
            st.save_history();

            let section = Arc::make_mut(&mut st.sections[si]);
            let before: Vec<(Uuid, u32)> =
                section.elements.iter().map(|e| (e.id, e.z_index)).collect();
            section.elements[ei].z_index = u32::MAX;
            section.reindex_elements();
            changed_elements(section, &before)
        };

        for e in restacked {
            self.persist_element_later(DebounceKey::Element(e.id), e.id, ElementPatch::full(&e));
        }
        true
    }

    fn edit_element(&self, id: Uuid, f: impl FnOnce(&mut Element)) -> Option<Element> {
        let mut guard = self.state.write();
        let st = &mut *guard;
        let (si, ei) = st.element_index(id)?;
        st.save_history();
        let element = &mut Arc::make_mut(&mut st.sections[si]).elements[ei];
        f(element);
        Some(element.clone())
    }

    // --- history ---

    /// Restores the previous snapshot. Local only; nothing is written.
    pub fn undo(&self) -> bool {
        let mut guard = self.state.write();
        let st = &mut *guard;
        match st.history.undo(&st.sections) {
            Some(previous) => {
                st.sections = previous;
                st.repair_selection();
                true
            }
            None => false,
        }
    }

    /// Re-applies the last undone snapshot. Local only; nothing is written.
    pub fn redo(&self) -> bool {
        let mut guard = self.state.write();
        let st = &mut *guard;
        match st.history.redo(&st.sections) {
            Some(next) => {
                st.sections = next;
                st.repair_selection();
                true
            }
            None => false,
        }
    }

    // --- persistence plumbing ---

    fn persist_section_later(&self, id: Uuid, patch: SectionPatch) {
        let persistence = Arc::clone(&self.persistence);
        self.debouncer.schedule(
            DebounceKey::Section(id),
            Box::pin(async move {
                if let Err(e) = persistence.update_section(id, patch).await {
                    tracing::warn!(section_id = %id, error = %e, "section update not persisted");
                }
            }),
        );
    }

    fn persist_element_later(&self, key: DebounceKey, id: Uuid, patch: ElementPatch) {
        let persistence = Arc::clone(&self.persistence);
        self.debouncer.schedule(
            key,
            Box::pin(async move {
                if let Err(e) = persistence.update_element(id, patch).await {
                    tracing::warn!(element_id = %id, error = %e, "element update not persisted");
                }
            }),
        );
    }

    /// Cancels pending writes. Returns how many were dropped.
    pub fn shutdown(&self) -> usize {
        let n = self.debouncer.cancel_all();
        tracing::info!(page_id = %self.config.page_id, cancelled = n, "editor store shut down");
        n
    }
}

fn changed_elements(section: &Section, before: &[(Uuid, u32)]) -> Vec<Element> {
    section
        .elements
        .iter()
        .filter(|e| !before.contains(&(e.id, e.z_index)))
        .cloned()
        .collect()
}
