use thiserror::Error;

/// The closed set of transforms a placeholder can apply.
///
/// New filters are added here and in [`Filter::from_call`]; there is no
/// runtime registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Lower,
    Upper,
    Title,
    Capitalize,
    Trim,
    SnakeCase,
    KebabCase,
    CamelCase,
    PascalCase,
    Slugify,
    Replace { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("unknown filter '{0}'")]
    Unknown(String),

    #[error("invalid arguments for '{name}': {reason}")]
    Arguments { name: String, reason: String },
}

impl Filter {
    pub const NAMES: &'static [&'static str] = &[
        "lower",
        "upper",
        "title",
        "capitalize",
        "trim",
        "snake_case",
        "kebab_case",
        "camel_case",
        "pascal_case",
        "slugify",
        "replace",
    ];

    /// Look up a filter by name and bind its arguments.
    pub fn from_call(name: &str, args: &[String]) -> Result<Filter, FilterError> {
        let filter = match name {
            "lower" => Filter::Lower,
            "upper" => Filter::Upper,
            "title" => Filter::Title,
            "capitalize" => Filter::Capitalize,
            // `strip` is the method-call spelling
            "trim" | "strip" => Filter::Trim,
            "snake_case" => Filter::SnakeCase,
            "kebab_case" => Filter::KebabCase,
            "camel_case" => Filter::CamelCase,
            "pascal_case" => Filter::PascalCase,
            "slugify" => Filter::Slugify,
            "replace" => {
                return match args {
                    [from, to] => Ok(Filter::Replace {
                        from: from.clone(),
                        to: to.clone(),
                    }),
                    _ => Err(FilterError::Arguments {
                        name: name.to_string(),
                        reason: format!("expected 2 arguments, got {}", args.len()),
                    }),
                };
            }
            _ => return Err(FilterError::Unknown(name.to_string())),
        };

        if !args.is_empty() {
            return Err(FilterError::Arguments {
                name: name.to_string(),
                reason: format!("takes no arguments, got {}", args.len()),
            });
        }
        Ok(filter)
    }

    pub fn apply(&self, input: &str) -> String {
        match self {
            Filter::Lower => input.to_lowercase(),
            Filter::Upper => input.to_uppercase(),
            Filter::Title => title(input),
            Filter::Capitalize => capitalize(input),
            Filter::Trim => input.trim().to_string(),
            Filter::SnakeCase => join_words(input, "_", str::to_lowercase),
            Filter::KebabCase => join_words(input, "-", str::to_lowercase),
            Filter::CamelCase => camel_case(input),
            Filter::PascalCase => join_words(input, "", capitalize),
            Filter::Slugify => slugify(input),
            Filter::Replace { from, to } => input.replace(from.as_str(), to),
        }
    }
}

/// Split into words on non-alphanumeric characters and on case boundaries
/// (`myApp` -> `my`, `App`; `HTTPServer` -> `HTTP`, `Server`).
fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn join_words(input: &str, sep: &str, f: impl Fn(&str) -> String) -> String {
    words(input)
        .iter()
        .map(|w| f(w.as_str()))
        .collect::<Vec<_>>()
        .join(sep)
}

fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn title(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for c in input.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn camel_case(input: &str) -> String {
    let mut out = String::new();
    for (i, word) in words(input).iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}
