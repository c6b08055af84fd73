use crate::document::ParsedDocument;
use crate::locator::{Located, Lookup};
use crate::types::{Finding, FindingKind};

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule. Rules read the document only through [`Lookup`]s and
/// never mutate it; a missing answer yields no findings.
pub struct Rule {
    pub id: &'static str,
    pub evaluate: fn(&ParsedDocument) -> Vec<Finding>,
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

pub const TECH_STACK: Lookup = Lookup {
    phase: "conception",
    question: "technologies et frameworks",
};

pub const ARCHITECTURE: Lookup = Lookup {
    phase: "conception",
    question: "architecture logicielle",
};

pub const TEST_TOOLS: Lookup = Lookup {
    phase: "tests",
    question: "outils de test",
};

pub const CONSTRAINTS: Lookup = Lookup {
    phase: "analyse des besoins",
    question: "contraintes techniques ou organisationnelles",
};

pub const SECURITY: Lookup = Lookup {
    phase: "développement",
    question: "sécurité de l'application",
};

// ---------------------------------------------------------------------------
// Vocabularies
// ---------------------------------------------------------------------------

/// A stack item and the lowercase substrings that reveal it.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

pub const BACKENDS: &[Vocabulary] = &[
    Vocabulary {
        label: "Node.js",
        keywords: &["node.js"],
    },
    Vocabulary {
        label: "Java/Spring",
        keywords: &["java", "spring"],
    },
    Vocabulary {
        label: "Python/Django",
        keywords: &["python", "django"],
    },
];

pub const DATABASES: &[Vocabulary] = &[
    Vocabulary {
        label: "PostgreSQL",
        keywords: &["postgresql"],
    },
    Vocabulary {
        label: "MongoDB",
        keywords: &["mongodb"],
    },
    Vocabulary {
        label: "MySQL",
        keywords: &["mysql"],
    },
];

/// Plain language and engine names counted by the constraints rule.
/// Framework names alone (`spring`, `django`) do not count.
pub const MULTI_TECH_BACKENDS: &[&str] = &["node.js", "java", "python"];
pub const MULTI_TECH_DATABASES: &[&str] = &["postgresql", "mongodb", "mysql"];

pub const JS_TEST_TOOLS: &[&str] = &["jest", "mocha"];
pub const TIGHT_DEADLINE: &[&str] = &["délai serré"];
pub const MICROSERVICES: &[&str] = &["microservices"];
pub const SUPERFICIAL_SECURITY: &[&str] = &["validation des entrées", "validation entrées"];
pub const ROBUST_SECURITY: &[&str] = &[
    "owasp",
    "chiffrement",
    "authentification forte",
    "tests de pénétration",
    "pare-feu",
];

/// Security answers at or above this word count are never called superficial.
pub const SECURITY_MIN_WORDS: usize = 15;

// ---------------------------------------------------------------------------
// Categories and texts
// ---------------------------------------------------------------------------

pub const CATEGORY_BACKEND: &str = "tech_stack_backend";
pub const CATEGORY_DATABASE: &str = "tech_stack_database";
pub const CATEGORY_TESTING_TOOLS: &str = "testing_tools_mismatch";
pub const CATEGORY_CONSTRAINTS: &str = "constraints_complexity_impact";
pub const CATEGORY_SECURITY: &str = "security_superficial";

const BACKEND_DETAILS: &str = "Veuillez sélectionner la technologie backend principale ou confirmer si toutes sont nécessaires (ex: microservices distincts).";
const DATABASE_DETAILS: &str = "Veuillez sélectionner le SGBD principal ou confirmer si tous sont nécessaires (ex: besoins de données différents).";

const TESTING_MESSAGE: &str = "Des outils de test JavaScript (Jest/Mocha) sont listés, mais la stack technologique principale ne semble pas être Node.js.";
const TESTING_DETAILS: &str = "Vérifiez l'adéquation de ces outils ou si un frontend JavaScript est concerné et non mentionné explicitement dans la stack backend.";
const TESTING_ACTIONS: &[&str] = &[
    "Confirmer la pertinence des outils",
    "Mettre à jour la stack technologique",
    "Ignorer",
];

const CONSTRAINTS_PREFIX: &str = "Suggestion : La contrainte 'Délai serré' est mentionnée. ";
pub const CONSTRAINTS_MICROSERVICES_CLAUSE: &str =
    "L'architecture microservices peut ajouter de la complexité. ";
pub const CONSTRAINTS_MULTI_TECH_CLAUSE: &str =
    "L'utilisation de multiples technologies backend/DB peut également impacter les délais. ";
const CONSTRAINTS_SUFFIX: &str =
    "Évaluez les risques et envisagez une approche par étapes (MVP) si nécessaire.";
const CONSTRAINTS_ACTIONS: &[&str] = &[
    "Réévaluer les choix techniques",
    "Planifier un MVP",
    "Accepter le risque",
];

const SECURITY_MESSAGE: &str = "La section sur la sécurité semble se limiter à des aspects basiques (ex: validation des entrées).";
const SECURITY_DETAILS: &str = "Envisagez de détailler davantage la stratégie de sécurité (ex: OWASP Top 10, gestion des secrets, tests de sécurité, chiffrement des données sensibles, etc.).";
const SECURITY_ACTIONS: &[&str] = &[
    "Détailler la section sécurité",
    "Planifier des tests de sécurité",
    "Ignorer pour l'instant",
];

// ---------------------------------------------------------------------------
// Matching helpers
// ---------------------------------------------------------------------------

fn mentions_any(haystack: &str, keywords: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn count_mentions(haystack: &str, keywords: &[&str]) -> usize {
    let lower = haystack.to_lowercase();
    keywords.iter().filter(|k| lower.contains(*k)).count()
}

/// Labels of every vocabulary entry mentioned in `text`, in vocabulary order.
pub fn detect(text: &str, vocabulary: &[Vocabulary]) -> Vec<String> {
    let lower = text.to_lowercase();
    vocabulary
        .iter()
        .filter(|v| v.keywords.iter().any(|k| lower.contains(k)))
        .map(|v| v.label.to_string())
        .collect()
}

fn decision(
    category: &str,
    message: String,
    details: &str,
    options: Vec<String>,
    at: &Located,
) -> Finding {
    Finding::new(FindingKind::DecisionNeeded, message)
        .category(category)
        .details(details)
        .options(options)
        .located(&at.phase.title, &at.question.text)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn tech_stack(doc: &ParsedDocument) -> Vec<Finding> {
    let Some(tech) = TECH_STACK.resolve(doc) else {
        return Vec::new();
    };
    let mut out = Vec::new();

    let backends = detect(tech.response(), BACKENDS);
    if backends.len() > 1 {
        let message = format!(
            "Multiples technologies backend listées : {}.",
            backends.join(", ")
        );
        out.push(decision(
            CATEGORY_BACKEND,
            message,
            BACKEND_DETAILS,
            backends,
            &tech,
        ));
    }

    let databases = detect(tech.response(), DATABASES);
    if databases.len() > 1 {
        let message = format!("Multiples SGBD listés : {}.", databases.join(", "));
        out.push(decision(
            CATEGORY_DATABASE,
            message,
            DATABASE_DETAILS,
            databases,
            &tech,
        ));
    }
    out
}

fn testing_tools(doc: &ParsedDocument) -> Vec<Finding> {
    let (Some(tools), Some(tech)) = (TEST_TOOLS.resolve(doc), TECH_STACK.resolve(doc)) else {
        return Vec::new();
    };
    let js_tools = mentions_any(tools.response(), JS_TEST_TOOLS);
    let backends = detect(tech.response(), BACKENDS);
    let node = backends.iter().any(|b| b == BACKENDS[0].label);
    if !js_tools || node || backends.is_empty() {
        return Vec::new();
    }
    vec![Finding::new(FindingKind::Warning, TESTING_MESSAGE)
        .category(CATEGORY_TESTING_TOOLS)
        .details(TESTING_DETAILS)
        .located(&tools.phase.title, &tools.question.text)
        .actions(TESTING_ACTIONS)]
}

fn constraints_vs_complexity(doc: &ParsedDocument) -> Vec<Finding> {
    let Some(constraints) = CONSTRAINTS.resolve(doc) else {
        return Vec::new();
    };
    if !mentions_any(constraints.response(), TIGHT_DEADLINE) {
        return Vec::new();
    }

    let architecture = ARCHITECTURE.resolve(doc);
    let tech = TECH_STACK.resolve(doc);
    let microservices = architecture
        .map(|a| mentions_any(a.response(), MICROSERVICES))
        .unwrap_or(false);
    let multi_tech = tech
        .map(|t| {
            count_mentions(t.response(), MULTI_TECH_BACKENDS) > 1
                || count_mentions(t.response(), MULTI_TECH_DATABASES) > 1
        })
        .unwrap_or(false);
    if !microservices && !multi_tech {
        return Vec::new();
    }

    let mut message = String::from(CONSTRAINTS_PREFIX);
    if microservices {
        message.push_str(CONSTRAINTS_MICROSERVICES_CLAUSE);
    }
    if multi_tech {
        message.push_str(CONSTRAINTS_MULTI_TECH_CLAUSE);
    }
    message.push_str(CONSTRAINTS_SUFFIX);

    let mut finding = Finding::new(FindingKind::Suggestion, message)
        .category(CATEGORY_CONSTRAINTS)
        .located(&constraints.phase.title, &constraints.question.text)
        .actions(CONSTRAINTS_ACTIONS);
    finding.related_phases.push(constraints.phase.title.clone());
    if let Some(driver) = architecture.filter(|_| microservices).or(tech) {
        if driver.phase.title != constraints.phase.title {
            finding.related_phases.push(driver.phase.title.clone());
        }
    }
    vec![finding]
}

fn security_completeness(doc: &ParsedDocument) -> Vec<Finding> {
    let Some(security) = SECURITY.resolve(doc) else {
        return Vec::new();
    };
    let answer = security.response();
    let superficial = mentions_any(answer, SUPERFICIAL_SECURITY);
    let robust = mentions_any(answer, ROBUST_SECURITY);
    let short = answer.split_whitespace().count() < SECURITY_MIN_WORDS;
    if !(superficial && !robust && short) {
        return Vec::new();
    }
    vec![Finding::new(FindingKind::Suggestion, SECURITY_MESSAGE)
        .category(CATEGORY_SECURITY)
        .details(SECURITY_DETAILS)
        .located(&security.phase.title, &security.question.text)
        .actions(SECURITY_ACTIONS)]
}

// ---------------------------------------------------------------------------
// Default rules (evaluation order is part of the output contract)
// ---------------------------------------------------------------------------

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "tech_stack",
            evaluate: tech_stack,
        },
        Rule {
            id: "testing_tools",
            evaluate: testing_tools,
        },
        Rule {
            id: "constraints_vs_complexity",
            evaluate: constraints_vs_complexity,
        },
        Rule {
            id: "security_completeness",
            evaluate: security_completeness,
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
