//! User-visible notifications
//!
//! Dismissible notices raised by failed moves and other background errors.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Default)]
struct NoticeBoard {
    notices: RefCell<Vec<Notice>>,
    next_id: Cell<u64>,
    listeners: RefCell<Vec<Rc<dyn Fn()>>>,
}

#[derive(Clone, Default)]
pub struct Notifications {
    inner: Rc<NoticeBoard>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    fn notify(&self) {
        let listeners: Vec<Rc<dyn Fn()>> = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }

    fn push(&self, level: NoticeLevel, message: String) -> u64 {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);
        self.inner.notices.borrow_mut().push(Notice { id, level, message });
        self.notify();
        id
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        let message = message.into();
        log::error!("[NOTICE] {}", message);
        self.push(NoticeLevel::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Info, message.into())
    }

    pub fn dismiss(&self, id: u64) {
        let removed = {
            let mut notices = self.inner.notices.borrow_mut();
            let before = notices.len();
            notices.retain(|n| n.id != id);
            before != notices.len()
        };
        if removed {
            self.notify();
        }
    }

    pub fn clear(&self) {
        self.inner.notices.borrow_mut().clear();
        self.notify();
    }

    pub fn list(&self) -> Vec<Notice> {
        self.inner.notices.borrow().clone()
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.list().into_iter().filter(|n| n.level == NoticeLevel::Error).collect()
    }
}
