pub mod chat;
pub mod suggestions;

#[cfg(test)]
pub(crate) mod testing;
