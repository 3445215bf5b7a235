pub(crate) mod bootstrap;
pub(crate) mod console;
pub(crate) mod demo;
pub(crate) mod editor;
pub(crate) mod loop_runner;
