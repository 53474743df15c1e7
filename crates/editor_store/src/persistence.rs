//! The datastore behind the editor.
//!
//! Create calls may return `Ok(None)` when the backend declines to store the
//! row; the store keeps its locally generated entity in that case, exactly as
//! it does for `Err`.

use crate::model::{Element, ElementPatch, Section, SectionPatch};
use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

#[async_trait]
pub trait EditorPersistence: Send + Sync + 'static {
    async fn fetch_sections(&self, page_id: Uuid) -> anyhow::Result<Vec<Section>>;

    async fn create_section(&self, section: Section) -> anyhow::Result<Option<Section>>;

    async fn update_section(&self, id: Uuid, patch: SectionPatch) -> anyhow::Result<()>;

    async fn delete_section(&self, id: Uuid) -> anyhow::Result<()>;

    /// `order` lists every section id of the page, first to last.
    async fn reorder_sections(&self, page_id: Uuid, order: Vec<Uuid>) -> anyhow::Result<()>;

    async fn create_element(&self, element: Element) -> anyhow::Result<Option<Element>>;

    async fn update_element(&self, id: Uuid, patch: ElementPatch) -> anyhow::Result<()>;

    async fn delete_element(&self, id: Uuid) -> anyhow::Result<()>;
}

/// Accepts nothing; every create is declined. For offline editing.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflinePersistence;

#[async_trait]
impl EditorPersistence for OfflinePersistence {
    async fn fetch_sections(&self, _page_id: Uuid) -> anyhow::Result<Vec<Section>> {
        Ok(Vec::new())
    }

    async fn create_section(&self, _section: Section) -> anyhow::Result<Option<Section>> {
        Ok(None)
    }

    async fn update_section(&self, _id: Uuid, _patch: SectionPatch) -> anyhow::Result<()> {
        Ok(())
    }

    async fn delete_section(&self, _id: Uuid) -> anyhow::Result<()> {
        Ok(())
    }

    async fn reorder_sections(&self, _page_id: Uuid, _order: Vec<Uuid>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn create_element(&self, _element: Element) -> anyhow::Result<Option<Element>> {
        Ok(None)
    }

    async fn update_element(&self, _id: Uuid, _patch: ElementPatch) -> anyhow::Result<()> {
        Ok(())
    }

    async fn delete_element(&self, _id: Uuid) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One call received by [`MemoryPersistence`].
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceCall {
    CreateSection(Uuid),
    UpdateSection(Uuid, SectionPatch),
    DeleteSection(Uuid),
    ReorderSections(Vec<Uuid>),
    CreateElement(Uuid),
    UpdateElement(Uuid, ElementPatch),
    DeleteElement(Uuid),
}

#[derive(Debug, Default)]
struct MemoryInner {
    sections: Vec<Section>,
    calls: Vec<PersistenceCall>,
    fail_writes: bool,
    assign_ids: bool,
}

/// In-process datastore that records every call. Rows are kept in order;
/// `fail_writes` makes every write return an error.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    inner: Mutex<MemoryInner>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sections(sections: Vec<Section>) -> Self {
        let this = Self::default();
        this.inner.lock().sections = sections;
        this
    }

    /// Created rows get a fresh id instead of keeping the client's.
    pub fn assign_ids(self, assign: bool) -> Self {
        self.inner.lock().assign_ids = assign;
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    pub fn calls(&self) -> Vec<PersistenceCall> {
        self.inner.lock().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<PersistenceCall> {
        std::mem::take(&mut self.inner.lock().calls)
    }

    pub fn sections(&self) -> Vec<Section> {
        self.inner.lock().sections.clone()
    }

    fn record(&self, call: PersistenceCall) -> anyhow::Result<parking_lot::MutexGuard<'_, MemoryInner>> {
        let mut inner = self.inner.lock();
        inner.calls.push(call);
        if inner.fail_writes {
            anyhow::bail!("datastore unavailable");
        }
        Ok(inner)
    }
}

#[async_trait]
impl EditorPersistence for MemoryPersistence {
    async fn fetch_sections(&self, page_id: Uuid) -> anyhow::Result<Vec<Section>> {
        let inner = self.inner.lock();
        let mut sections: Vec<Section> = inner
            .sections
            .iter()
            .filter(|s| s.page_id == page_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| s.order_index);
        Ok(sections)
    }

    async fn create_section(&self, mut section: Section) -> anyhow::Result<Option<Section>> {
        let mut inner = self.record(PersistenceCall::CreateSection(section.id))?;
        if inner.assign_ids {
            section.id = Uuid::new_v4();
        }
        inner.sections.push(section.clone());
        Ok(Some(section))
    }

    async fn update_section(&self, id: Uuid, patch: SectionPatch) -> anyhow::Result<()> {
        let mut inner = self.record(PersistenceCall::UpdateSection(id, patch.clone()))?;
        match inner.sections.iter_mut().find(|s| s.id == id) {
            Some(section) => {
                patch.apply(section);
                Ok(())
            }
            None => anyhow::bail!("section {id} not found"),
        }
    }

    async fn delete_section(&self, id: Uuid) -> anyhow::Result<()> {
        let mut inner = self.record(PersistenceCall::DeleteSection(id))?;
        inner.sections.retain(|s| s.id != id);
        Ok(())
    }

    async fn reorder_sections(&self, _page_id: Uuid, order: Vec<Uuid>) -> anyhow::Result<()> {
        let mut inner = self.record(PersistenceCall::ReorderSections(order.clone()))?;
        for (i, id) in order.iter().enumerate() {
            if let Some(s) = inner.sections.iter_mut().find(|s| s.id == *id) {
                s.order_index = i as u32;
            }
        }
        Ok(())
    }

    async fn create_element(&self, mut element: Element) -> anyhow::Result<Option<Element>> {
        let mut inner = self.record(PersistenceCall::CreateElement(element.id))?;
        if inner.assign_ids {
            element.id = Uuid::new_v4();
        }
        match inner.sections.iter_mut().find(|s| s.id == element.section_id) {
            Some(section) => {
                section.elements.push(element.clone());
                Ok(Some(element))
            }
            None => Ok(None),
        }
    }

    async fn update_element(&self, id: Uuid, patch: ElementPatch) -> anyhow::Result<()> {
        let mut inner = self.record(PersistenceCall::UpdateElement(id, patch.clone()))?;
        let element = inner
            .sections
            .iter_mut()
            .flat_map(|s| s.elements.iter_mut())
            .find(|e| e.id == id);
        match element {
            Some(e) => {
                patch.apply(e);
                Ok(())
            }
            None => anyhow::bail!("element {id} not found"),
        }
    }

    async fn delete_element(&self, id: Uuid) -> anyhow::Result<()> {
        let mut inner = self.record(PersistenceCall::DeleteElement(id))?;
        for section in inner.sections.iter_mut() {
            section.elements.retain(|e| e.id != id);
        }
        Ok(())
    }
}
