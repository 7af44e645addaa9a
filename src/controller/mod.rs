//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input
//! and coordinates between the model and the backend requests it triggers.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `requests`: Backend requests run off the UI loop

mod input;
mod requests;

use crate::model::AppModel;

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: AppModel,
}

impl AppController {
    pub fn new(model: AppModel) -> Self {
        Self { model }
    }
}
