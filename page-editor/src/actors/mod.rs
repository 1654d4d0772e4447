pub mod page_editor;

pub use page_editor::{PageEditorActor, PageEditorArguments, PageEditorMsg};
