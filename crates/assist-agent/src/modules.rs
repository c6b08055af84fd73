//! Prompt modules: turn a task string into a generator prompt.
//!
//! Tasks are routed by prefix (`doc:`, `refactor:`, `analyse:`); anything
//! else goes to the chat fallback unchanged.

use std::path::{Path, PathBuf};

use crate::{AgentError, Result};

pub trait Module: Send + Sync {
    fn name(&self) -> &'static str;
    fn can_handle(&self, task: &str) -> bool;
    fn build_prompt(&self, task: &str) -> Result<String>;
}

/// Case-insensitive ASCII prefix strip.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

// ─── DocModule ────────────────────────────────────────────────────────────

const DOC_PREFIX: &str = "doc:";
const DOC_AUTO_PREFIX: &str = "auto:";

const DOC_INSTRUCTIONS: &str = "\
Instructions pour la documentation HTML :
1. Document HTML complet : inclure `<!DOCTYPE html>`, `<html>`, `<head>`, `<body>`.
2. Titre : un titre pertinent dans `<title>` et dans un `<h1>`.
3. Style CSS intégré : une section `<style>` dans le `<head>` pour une page agréable à lire (police, marges, espacements, couleurs sobres, titres, paragraphes, listes). Pas de CSS de coloration syntaxique ici.
4. Coloration syntaxique (Prism.js) :
   a. Dans le `<head>`, le thème depuis un CDN : `<link href=\"https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/themes/prism-okaidia.min.css\" rel=\"stylesheet\" />`
   b. Chaque bloc `<pre><code>` porte la classe de langage, par exemple `<pre><code class=\"language-rust\">`.
   c. Juste avant `</body>` : `<script src=\"https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/components/prism-core.min.js\"></script>` puis `<script src=\"https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/plugins/autoloader/prism-autoloader.min.js\"></script>`
5. Structure : balises sémantiques HTML5 (`<header>`, `<nav>`, `<main>`, `<section>`, `<footer>` si pertinent).
6. Sections requises, avec des titres `<h2>` ou `<h3>` : Introduction, Architecture/Fonctionnement, Modules/Composants (si pertinent), Dépendances (si pertinent), Blocs de code importants, Conclusion.
7. Diagrammes Mermaid : si pertinent, un diagramme à la syntaxe simple et strictement valide (ex : `graph TD; A-->B;`) dans un `<pre class=\"mermaid\">`, sans délimiteurs ```mermaid.
8. Inclusion de Mermaid.js : juste avant `</body>`, après les scripts Prism.js, `<script src=\"https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js\"></script>` puis `<script>mermaid.initialize({startOnLoad:true});</script>`.
9. Profondeur : expliquer la logique métier, les interactions entre composants, les choix de conception apparents et les objectifs de chaque module.
10. Clarté : contenu clair, bien organisé et techniquement précis.

Génère uniquement le code HTML complet, sans oublier les étapes 4, 7 et 8.";

/// `doc:<context>` or `doc:auto:<project dir>`.
pub struct DocModule;

impl DocModule {
    pub fn prompt_for(context: &str) -> String {
        format!(
            "Tu es un assistant technique expert en HTML et en documentation logicielle. \
             Génère une documentation structurée, professionnelle et esthétique en HTML \
             pour le projet/code suivant :\n\n'''\n{context}\n'''\n\n{DOC_INSTRUCTIONS}"
        )
    }
}

impl Module for DocModule {
    fn name(&self) -> &'static str {
        "doc"
    }

    fn can_handle(&self, task: &str) -> bool {
        strip_prefix_ci(task.trim(), DOC_PREFIX).is_some()
    }

    fn build_prompt(&self, task: &str) -> Result<String> {
        let body = strip_prefix_ci(task.trim(), DOC_PREFIX).unwrap_or(task);
        let context = match strip_prefix_ci(body, DOC_AUTO_PREFIX) {
            Some(dir) => project_context(Path::new(dir.trim()))?,
            None => body.trim().to_string(),
        };
        Ok(Self::prompt_for(&context))
    }
}

// ─── Project context ──────────────────────────────────────────────────────

const README_MAX_CHARS: usize = 2000;
const MAX_SOURCE_FILES: usize = 5;
const SOURCE_MAX_CHARS: usize = 3000;
const SOURCE_EXTENSIONS: &[&str] = &["rs", "py", "js", "ts", "java", "go"];
const SKIPPED_DIRS: &[&str] = &["target", "node_modules", "__pycache__"];

/// Summarize a project directory for the documentation prompt: name, README
/// excerpt, file tree, and excerpts of the first few source files.
pub fn project_context(root: &Path) -> Result<String> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    let mut parts = vec![format!("Projet : {name}")];

    let readme = root.join("README.md");
    if readme.is_file() {
        let text = std::fs::read_to_string(&readme)?;
        parts.push(format!("README.md :\n{}", truncate(&text, README_MAX_CHARS)));
    }

    parts.push("Structure du projet :".to_string());
    let mut sources = Vec::new();
    walk(root, 0, &mut parts, &mut sources)?;

    parts.push("\nExtraits de code :".to_string());
    let mut excerpts = 0;
    for path in &sources {
        if excerpts == MAX_SOURCE_FILES {
            break;
        }
        let Ok(text) = std::fs::read_to_string(path) else {
            tracing::debug!(path = %path.display(), "skipping unreadable source file");
            continue;
        };
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let lang = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        parts.push(format!(
            "\n### {file} :\n```{lang}\n{}\n```",
            truncate(&text, SOURCE_MAX_CHARS)
        ));
        excerpts += 1;
    }

    Ok(parts.join("\n"))
}

fn walk(dir: &Path, depth: usize, tree: &mut Vec<String>, sources: &mut Vec<PathBuf>) -> Result<()> {
    let indent = "  ".repeat(depth);
    let label = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tree.push(format!("{indent}- {label}/"));

    // Symlinks are neither listed nor followed.
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)?.filter_map(|e| e.ok()) {
        let Ok(kind) = entry.file_type() else { continue };
        if kind.is_dir() {
            dirs.push(entry.path());
        } else if kind.is_file() {
            files.push(entry.path());
        }
    }
    dirs.sort();
    files.sort();

    for file in files {
        let Some(fname) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        tree.push(format!("{indent}  - {fname}"));
        let is_source = file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SOURCE_EXTENSIONS.contains(&e))
            .unwrap_or(false);
        if is_source {
            sources.push(file);
        }
    }
    for sub in dirs {
        let skip = sub
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.') || SKIPPED_DIRS.contains(&n))
            .unwrap_or(true);
        if !skip {
            walk(&sub, depth + 1, tree, sources)?;
        }
    }
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ─── RefactorModule ───────────────────────────────────────────────────────

const REFACTOR_PREFIX: &str = "refactor:";
const INSTRUCTION_SEPARATOR: &str = "::";
pub const DEFAULT_REFACTOR_INSTRUCTION: &str = "Refactorise le code suivant de manière propre.";

/// `refactor:<instruction>::<code>`, or `refactor:<code>` with the default
/// instruction.
pub struct RefactorModule;

impl Module for RefactorModule {
    fn name(&self) -> &'static str {
        "refactor"
    }

    fn can_handle(&self, task: &str) -> bool {
        strip_prefix_ci(task.trim(), REFACTOR_PREFIX).is_some()
    }

    fn build_prompt(&self, task: &str) -> Result<String> {
        let raw = strip_prefix_ci(task.trim(), REFACTOR_PREFIX)
            .unwrap_or(task)
            .trim();
        let (instruction, code) = raw
            .split_once(INSTRUCTION_SEPARATOR)
            .unwrap_or((DEFAULT_REFACTOR_INSTRUCTION, raw));
        Ok(format!(
            "Tu es un assistant expert en développement. Voici une consigne de refactorisation :\n\
             - Instruction : {}\n\n\
             Voici le code source à améliorer/refactoriser :\n```\n{}\n```\n\n\
             Renvoie uniquement le code refactorisé dans un bloc de code Markdown.",
            instruction.trim(),
            code.trim()
        ))
    }
}

// ─── AnalysisModule ───────────────────────────────────────────────────────

const ANALYSIS_PREFIX: &str = "analyse:";

/// `analyse:` reviews the project's context document; `analyse:<path>`
/// reviews another document. Relative paths resolve against the project root.
pub struct AnalysisModule {
    root: PathBuf,
    context_file: PathBuf,
}

impl AnalysisModule {
    pub fn new(root: impl Into<PathBuf>, context_file: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            context_file: context_file.into(),
        }
    }

    pub fn prompt_for(markdown: &str) -> String {
        format!(
            "Vous êtes un assistant expert en gestion de projet logiciel. \
             Analysez le document Markdown suivant, qui décrit un projet. \
             Évaluez sa cohérence globale, en identifiant les points forts, les faiblesses, \
             les ambiguïtés, les contradictions potentielles, ou les manques d'informations critiques. \
             Fournissez un rapport structuré et détaillé sous format Markdown.\n\n\
             Document du projet:\n{markdown}"
        )
    }
}

impl Module for AnalysisModule {
    fn name(&self) -> &'static str {
        "analyse"
    }

    fn can_handle(&self, task: &str) -> bool {
        strip_prefix_ci(task.trim(), ANALYSIS_PREFIX).is_some()
    }

    fn build_prompt(&self, task: &str) -> Result<String> {
        let arg = strip_prefix_ci(task.trim(), ANALYSIS_PREFIX)
            .unwrap_or("")
            .trim();
        let path = if arg.is_empty() {
            self.root.join(&self.context_file)
        } else {
            self.root.join(arg)
        };
        let markdown = std::fs::read_to_string(&path).map_err(|source| AgentError::Read {
            path: path.clone(),
            source,
        })?;
        if markdown.trim().is_empty() {
            return Err(AgentError::Generation(format!(
                "{} is empty, nothing to analyse",
                path.display()
            )));
        }
        Ok(Self::prompt_for(&markdown))
    }
}

// ─── ChatModule ───────────────────────────────────────────────────────────

/// Fallback: the task is the prompt.
pub struct ChatModule;

impl Module for ChatModule {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn can_handle(&self, _task: &str) -> bool {
        true
    }

    fn build_prompt(&self, task: &str) -> Result<String> {
        Ok(task.trim().to_string())
    }
}

// ─── ModuleRegistry ───────────────────────────────────────────────────────

pub struct ModuleRegistry {
    modules: Vec<Box<dyn Module>>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new(vec![
            Box::new(DocModule),
            Box::new(RefactorModule),
            Box::new(ChatModule),
        ])
    }
}

impl ModuleRegistry {
    /// Modules are tried in order; the first that accepts a task wins.
    pub fn new(modules: Vec<Box<dyn Module>>) -> Self {
        Self { modules }
    }

    /// The default modules plus project analysis over `context_file`.
    pub fn for_project(root: &Path, context_file: &Path) -> Self {
        Self::new(vec![
            Box::new(DocModule),
            Box::new(RefactorModule),
            Box::new(AnalysisModule::new(root, context_file)),
            Box::new(ChatModule),
        ])
    }

    pub fn route(&self, task: &str) -> Option<&dyn Module> {
        let module = self
            .modules
            .iter()
            .find(|m| m.can_handle(task))
            .map(|m| m.as_ref());
        if let Some(m) = module {
            tracing::debug!(module = m.name(), "task routed");
        }
        module
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn routes_by_prefix_case_insensitively() {
        let registry = ModuleRegistry::default();
        assert_eq!(registry.route("doc: mon projet").unwrap().name(), "doc");
        assert_eq!(registry.route("  DOC:x").unwrap().name(), "doc");
        assert_eq!(registry.route("Refactor: fn a() {}").unwrap().name(), "refactor");
        assert_eq!(registry.route("Bonjour").unwrap().name(), "chat");
        assert_eq!(registry.names(), vec!["doc", "refactor", "chat"]);
    }

    #[test]
    fn project_registry_routes_analysis() {
        let registry = ModuleRegistry::for_project(Path::new("."), Path::new("context.md"));
        assert_eq!(registry.route("ANALYSE:").unwrap().name(), "analyse");
        assert_eq!(registry.route("analyse des besoins").unwrap().name(), "chat");
        assert_eq!(registry.names(), vec!["doc", "refactor", "analyse", "chat"]);
    }

    #[test]
    fn empty_registry_routes_nothing() {
        assert!(ModuleRegistry::new(vec![]).route("doc:x").is_none());
    }

    #[test]
    fn doc_prompt_wraps_context() {
        let prompt = DocModule.build_prompt("doc: Gestionnaire de tâches").unwrap();
        assert!(prompt.contains("'''\nGestionnaire de tâches\n'''"));
        assert!(prompt.contains("mermaid.initialize"));
    }

    #[test]
    fn refactor_splits_instruction_and_code() {
        let prompt = RefactorModule
            .build_prompt("refactor: renomme x en total :: let x = 1;")
            .unwrap();
        assert!(prompt.contains("- Instruction : renomme x en total\n"));
        assert!(prompt.contains("```\nlet x = 1;\n```"));
    }

    #[test]
    fn refactor_without_separator_uses_default_instruction() {
        let prompt = RefactorModule.build_prompt("refactor: let x = 1;").unwrap();
        assert!(prompt.contains(DEFAULT_REFACTOR_INSTRUCTION));
        assert!(prompt.contains("```\nlet x = 1;\n```"));
    }

    #[test]
    fn analysis_reads_configured_context_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("context")).unwrap();
        std::fs::write(dir.path().join("context/context.md"), "# Projet : Démo\n").unwrap();
        let module = AnalysisModule::new(dir.path(), "context/context.md");

        let prompt = module.build_prompt("analyse:").unwrap();
        assert!(prompt.starts_with("Vous êtes un assistant expert en gestion de projet"));
        assert!(prompt.contains("cohérence globale"));
        assert!(prompt.ends_with("Document du projet:\n# Projet : Démo\n"));
    }

    #[test]
    fn analysis_accepts_explicit_relative_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("autre.md"), "## Phase : Tests\n").unwrap();
        let module = AnalysisModule::new(dir.path(), "context/context.md");
        let prompt = module.build_prompt("analyse: autre.md").unwrap();
        assert!(prompt.contains("## Phase : Tests"));
    }

    #[test]
    fn analysis_missing_or_empty_document_is_error() {
        let dir = TempDir::new().unwrap();
        let module = AnalysisModule::new(dir.path(), "context/context.md");
        assert!(matches!(
            module.build_prompt("analyse:"),
            Err(AgentError::Read { .. })
        ));

        std::fs::write(dir.path().join("vide.md"), "  \n").unwrap();
        assert!(matches!(
            module.build_prompt("analyse: vide.md"),
            Err(AgentError::Generation(_))
        ));
    }

    #[test]
    fn chat_passes_task_through() {
        assert_eq!(ChatModule.build_prompt("  salut \n").unwrap(), "salut");
    }

    #[test]
    fn project_context_lists_tree_and_sources() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("README.md"), "# Démo\nUn projet.").unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        std::fs::create_dir_all(root.join("target/debug")).unwrap();
        std::fs::write(root.join("target/debug/junk.rs"), "junk").unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();

        let ctx = project_context(root).unwrap();
        assert!(ctx.contains("README.md :\n# Démo\nUn projet."));
        assert!(ctx.contains("  - src/\n    - main.rs"));
        assert!(ctx.contains("### main.rs :\n```rs\nfn main() {}\n```"));
        assert!(!ctx.contains("junk"));
        assert!(!ctx.contains(".git"));
    }

    #[cfg(unix)]
    #[test]
    fn project_context_does_not_follow_symlinks() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("a.rs"), "fn a() {}").unwrap();
        std::os::unix::fs::symlink(root, root.join("loop")).unwrap();
        std::os::unix::fs::symlink(root.join("a.rs"), root.join("b.rs")).unwrap();

        let ctx = project_context(root).unwrap();
        assert!(!ctx.contains("- loop/"));
        assert!(!ctx.contains("- b.rs"));
        assert_eq!(ctx.matches("### a.rs :").count(), 1);
    }

    #[test]
    fn unreadable_sources_do_not_use_excerpt_slots() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        // Invalid UTF-8 fails read_to_string.
        std::fs::write(root.join("a0.rs"), [0xff, 0xfe, 0xfd]).unwrap();
        for i in 1..=MAX_SOURCE_FILES {
            std::fs::write(root.join(format!("a{i}.rs")), format!("fn f{i}() {{}}")).unwrap();
        }

        let ctx = project_context(root).unwrap();
        assert_eq!(ctx.matches("```rs\n").count(), MAX_SOURCE_FILES);
        assert!(ctx.contains(&format!("fn f{MAX_SOURCE_FILES}() {{}}")));
        assert!(!ctx.contains("### a0.rs :"));
    }

    #[test]
    fn doc_auto_reads_project_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("lib.py"), "def f(): pass").unwrap();
        let task = format!("doc:auto:{}", dir.path().display());
        let prompt = DocModule.build_prompt(&task).unwrap();
        assert!(prompt.contains("def f(): pass"));
    }

    #[test]
    fn doc_auto_missing_directory_is_error() {
        assert!(DocModule
            .build_prompt("doc:auto:/nonexistent/assist-project")
            .is_err());
    }
}
