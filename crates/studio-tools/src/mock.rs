//! Deterministic offline provider.

use crate::command::ToolCommand;
use crate::provider::{CommandProvider, TurnContext};
use async_trait::async_trait;
use std::collections::BTreeSet;
use studio_core::Result;

const COUNTER: &str = r#"import { useState } from 'react';

export default function Counter() {
  const [count, setCount] = useState(0);
  return (
    <div className="counter">
      <p>Count: {count}</p>
      <button onClick={() => setCount(count + 1)}>Increment</button>
    </div>
  );
}
"#;

const CONTACT_FORM: &str = r#"import { useState } from 'react';

export default function ContactForm() {
  const [email, setEmail] = useState('');
  const [sent, setSent] = useState(false);
  if (sent) {
    return <p className="notice">Thanks, we will be in touch.</p>;
  }
  return (
    <form onSubmit={(event) => { event.preventDefault(); setSent(true); }}>
      <label htmlFor="email">Email</label>
      <input
        id="email"
        type="email"
        value={email}
        onChange={(event) => setEmail(event.target.value)}
      />
      <button type="submit">Send</button>
    </form>
  );
}
"#;

const PROFILE_CARD: &str = r#"import '@/styles/card.css';

export default function ProfileCard() {
  return (
    <article className="card">
      <h2>Ada Lovelace</h2>
      <p>Mathematician and writer.</p>
    </article>
  );
}
"#;

const CARD_STYLES: &str = ".card {
  border: 1px solid #d0d7de;
  border-radius: 8px;
  padding: 16px;
  max-width: 320px;
}
";

const WELCOME: &str = r"export default function Welcome() {
  return <h1>Welcome to Component Studio</h1>;
}
";

/// A component the mock provider knows how to scaffold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Template {
    name: &'static str,
    keywords: &'static [&'static str],
    source: &'static str,
    stylesheet: Option<(&'static str, &'static str)>,
}

const TEMPLATES: [Template; 3] = [
    Template {
        name: "Counter",
        keywords: &["counter", "count", "increment"],
        source: COUNTER,
        stylesheet: None,
    },
    Template {
        name: "ContactForm",
        keywords: &["form", "contact", "signup"],
        source: CONTACT_FORM,
        stylesheet: None,
    },
    Template {
        name: "ProfileCard",
        keywords: &["card", "profile"],
        source: PROFILE_CARD,
        stylesheet: Some(("/styles/card.css", CARD_STYLES)),
    },
];

const FALLBACK: Template = Template {
    name: "Welcome",
    keywords: &[],
    source: WELCOME,
    stylesheet: None,
};

/// Offline provider that scaffolds a component chosen from prompt keywords.
///
/// The prompt is matched word by word against `counter`, `form` and `card`
/// (and a few synonyms); anything else scaffolds a welcome banner. A turn
/// creates the component under `/components`, its stylesheet if it has one,
/// and regenerates `/App.jsx` to render every component in the project.
/// At most four commands are issued, which fits the constrained budget.
///
/// Output depends only on the prompt and the project's file list.
///
/// # Examples
///
/// ```
/// use studio_core::ExecutionMode;
/// use studio_tools::{CommandProvider, MockProvider, ToolCommand, TurnContext};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let context = TurnContext::new(1, "Build a counter", ExecutionMode::Constrained, 4);
/// let commands = MockProvider::new().produce_next_commands(&context).await.unwrap();
///
/// assert_eq!(commands.len(), 2);
/// assert!(matches!(
///     &commands[0],
///     ToolCommand::CreateFile { path, .. } if path == "/components/Counter.jsx"
/// ));
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Commands for one prompt against the given project files.
    #[must_use]
    pub fn plan(prompt: &str, files: &[String]) -> Vec<ToolCommand> {
        let template = select(prompt);
        let component = format!("/components/{}.jsx", template.name);
        if files.iter().any(|f| *f == component) {
            return Vec::new();
        }

        let mut commands = vec![ToolCommand::CreateFile {
            path: component.clone(),
            content: template.source.to_string(),
        }];
        if let Some((path, content)) = template.stylesheet
            && !files.iter().any(|f| f == path)
        {
            commands.push(ToolCommand::CreateFile {
                path: path.to_string(),
                content: content.to_string(),
            });
        }

        let mut components: BTreeSet<&str> = files
            .iter()
            .filter_map(|f| f.strip_prefix("/components/")?.strip_suffix(".jsx"))
            .filter(|name| !name.contains('/'))
            .collect();
        components.insert(template.name);

        if files.iter().any(|f| f == "/App.jsx") {
            commands.push(ToolCommand::DeleteFile {
                path: "/App.jsx".to_string(),
            });
        }
        commands.push(ToolCommand::CreateFile {
            path: "/App.jsx".to_string(),
            content: app_source(&components),
        });
        commands
    }
}

#[async_trait]
impl CommandProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn produce_next_commands(&self, context: &TurnContext) -> Result<Vec<ToolCommand>> {
        if !context.is_first_round() {
            return Ok(Vec::new());
        }
        let commands = Self::plan(&context.prompt, &context.files);
        tracing::debug!(
            turn = context.turn,
            commands = commands.len(),
            "mock provider planned turn"
        );
        Ok(commands)
    }
}

fn select(prompt: &str) -> Template {
    let words: Vec<String> = prompt
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .map(|w| w.strip_suffix('s').map(str::to_string).unwrap_or(w))
        .collect();
    TEMPLATES
        .into_iter()
        .find(|t| t.keywords.iter().any(|k| words.iter().any(|w| w == k)))
        .unwrap_or(FALLBACK)
}

fn app_source(components: &BTreeSet<&str>) -> String {
    let mut source = String::new();
    for name in components {
        source.push_str(&format!("import {name} from '@/components/{name}';\n"));
    }
    source.push_str("\nexport default function App() {\n  return (\n    <main>\n");
    for name in components {
        source.push_str(&format!("      <{name} />\n"));
    }
    source.push_str("    </main>\n  );\n}\n");
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_selection() {
        assert_eq!(select("Add a COUNTER please").name, "Counter");
        assert_eq!(select("a signup form").name, "ContactForm");
        assert_eq!(select("show some profile cards").name, "ProfileCard");
        assert_eq!(select("information about formats").name, "Welcome");
    }

    #[test]
    fn test_card_plan_fits_constrained_budget() {
        let files = vec!["/App.jsx".to_string(), "/components/Counter.jsx".to_string()];
        let commands = MockProvider::plan("card", &files);
        let names: Vec<_> = commands.iter().map(ToolCommand::name).collect();
        assert_eq!(names, vec!["create_file", "create_file", "delete_file", "create_file"]);

        let ToolCommand::CreateFile { content, .. } = &commands[3] else {
            panic!("expected App.jsx");
        };
        assert!(content.starts_with(
            "import Counter from '@/components/Counter';\n\
             import ProfileCard from '@/components/ProfileCard';\n"
        ));
        assert!(content.contains("      <Counter />\n      <ProfileCard />\n"));
    }

    #[test]
    fn test_existing_component_yields_nothing() {
        let files = vec!["/components/Counter.jsx".to_string()];
        assert!(MockProvider::plan("counter", &files).is_empty());
    }

    #[test]
    fn test_templates_transform() {
        for template in TEMPLATES.iter().chain([&FALLBACK]) {
            let path = format!("/components/{}.jsx", template.name);
            let output = studio_transform::transform(&path, template.source).unwrap();
            assert!(output.exports.has_default, "{}", template.name);
        }
        let components: BTreeSet<&str> = ["Counter", "Welcome"].into_iter().collect();
        studio_transform::transform("/App.jsx", &app_source(&components)).unwrap();
    }
}
