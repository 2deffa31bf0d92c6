//! Grounding prompt: context and question rendered into a fixed template.

use sabio_index::RetrievedChunk;

/// Default grounding template. Instructs the model to answer only from the
/// provided context and to decline when the context does not cover the
/// question.
pub const DEFAULT_TEMPLATE: &str = "\
Eres un asistente experto en los productos de la empresa.
Tu tarea es responder las preguntas del usuario basándote únicamente en el contexto proporcionado.
Si la información no se encuentra en el contexto, responde amablemente que no tienes esa información.
No inventes respuestas.

Contexto:
{context}

Pregunta del usuario:
{question}

Respuesta del asistente:
";

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// A validated prompt template with `{context}` and `{question}` slots.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Validate and wrap a template string.
    ///
    /// # Errors
    ///
    /// Returns an error if either placeholder is absent. Meant to run at
    /// startup so a broken template fails the process before it serves.
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        if !template.contains(CONTEXT_SLOT) {
            return Err(PromptError::MissingPlaceholder(CONTEXT_SLOT));
        }
        if !template.contains(QUESTION_SLOT) {
            return Err(PromptError::MissingPlaceholder(QUESTION_SLOT));
        }
        Ok(Self { template })
    }

    /// Render the template with retrieved chunks and the user question.
    ///
    /// Chunk texts join with blank lines; an empty retrieval renders an
    /// empty context section, which combined with the template instruction
    /// steers the model toward declining.
    #[must_use]
    pub fn render(&self, chunks: &[RetrievedChunk], question: &str) -> String {
        let context = assemble_context(chunks);
        interpolate(&self.template, &context, question)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_owned(),
        }
    }
}

fn assemble_context(chunks: &[RetrievedChunk]) -> String {
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    texts.join("\n\n")
}

/// Single-pass interpolation. Each placeholder substitutes once, in order of
/// appearance, and substituted values are never re-scanned, so a question
/// containing `{context}` cannot inject into the other slot.
fn interpolate(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;
    loop {
        let ctx_pos = rest.find(CONTEXT_SLOT);
        let q_pos = rest.find(QUESTION_SLOT);
        let (pos, slot, value) = match (ctx_pos, q_pos) {
            (Some(c), None) => (c, CONTEXT_SLOT, context),
            (Some(c), Some(q)) if c < q => (c, CONTEXT_SLOT, context),
            (_, Some(q)) => (q, QUESTION_SLOT, question),
            (None, None) => {
                out.push_str(rest);
                return out;
            }
        };
        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + slot.len()..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_owned(),
            source: "doc.txt".to_owned(),
            chunk_index: 0,
            score: 0.9,
        }
    }

    #[test]
    fn default_template_is_valid() {
        assert!(PromptTemplate::new(DEFAULT_TEMPLATE).is_ok());
    }

    #[test]
    fn missing_placeholders_rejected() {
        assert!(matches!(
            PromptTemplate::new("solo {question}"),
            Err(PromptError::MissingPlaceholder("{context}"))
        ));
        assert!(matches!(
            PromptTemplate::new("solo {context}"),
            Err(PromptError::MissingPlaceholder("{question}"))
        ));
    }

    #[test]
    fn render_inserts_context_and_question() {
        let template = PromptTemplate::default();
        let rendered = template.render(
            &[chunk("La garantía dura dos años.")],
            "¿Cuánto dura la garantía?",
        );
        assert!(rendered.contains("La garantía dura dos años."));
        assert!(rendered.contains("¿Cuánto dura la garantía?"));
        assert!(!rendered.contains("{context}"));
        assert!(!rendered.contains("{question}"));
    }

    #[test]
    fn chunks_join_with_blank_lines() {
        let template = PromptTemplate::new("{context}|{question}").unwrap();
        let rendered = template.render(&[chunk("uno"), chunk("dos")], "q");
        assert_eq!(rendered, "uno\n\ndos|q");
    }

    #[test]
    fn empty_retrieval_renders_empty_context() {
        let template = PromptTemplate::new("C:{context} P:{question}").unwrap();
        let rendered = template.render(&[], "¿hola?");
        assert_eq!(rendered, "C: P:¿hola?");
    }

    #[test]
    fn question_containing_placeholder_is_not_expanded() {
        let template = PromptTemplate::new("{context}|{question}").unwrap();
        let rendered = template.render(&[chunk("dato")], "di {context}");
        assert_eq!(rendered, "dato|di {context}");
    }
}
