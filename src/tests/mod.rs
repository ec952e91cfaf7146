pub(crate) mod support;

mod recording;
