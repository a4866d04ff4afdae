/// The single-turn RAG prompt sent to the chat provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    subject_name: String,
}

impl PromptTemplate {
    pub fn new(subject_name: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
        }
    }

    pub fn render(&self, context: &str, query: &str) -> String {
        format!(
            "Based on the following context about {}, answer the user's question.\n\n\
             Context: {context}\n\n\
             Question: {query}\n\n\
             Answer:",
            self.subject_name
        )
    }
}
