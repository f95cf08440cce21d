pub(crate) mod relay;
