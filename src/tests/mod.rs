use super::*;

use std::cell::RefCell;
use std::rc::Rc;

mod page_events_and_keyboard;

/// Shared log for listeners that record what they observed.
fn recorder() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}
