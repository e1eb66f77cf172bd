pub mod code_actions;
pub mod commands;
pub mod diagnostics;
pub mod formatting;
pub mod ignore_list;
pub mod line_index;

#[cfg(test)]
pub(crate) mod test_support;
