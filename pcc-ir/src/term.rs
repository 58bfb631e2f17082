//! Terms: the opaque payload of declarations (types, bodies, expressions).

use std::fmt;

use pcc_core::Span;

/// A structured term as produced by the parser and understood by the model
/// engine. The compiler never interprets terms beyond printing them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A string constant.
    Str(String),
    /// An integer constant.
    Int(i64),
    /// A symbolic constant or reference (e.g. `TRUE`, `NIL`, an alias).
    Id(String),
    /// A function application.
    App {
        functor: String,
        args: Vec<Term>,
        span: Span,
    },
}

impl Term {
    pub fn str(value: impl Into<String>) -> Self {
        Term::Str(value.into())
    }

    pub fn id(value: impl Into<String>) -> Self {
        Term::Id(value.into())
    }

    /// A function application with no location.
    pub fn app(functor: impl Into<String>, args: Vec<Term>) -> Self {
        Term::App {
            functor: functor.into(),
            args,
            span: Span::default(),
        }
    }

    /// Attach a source span. Constants carry no location and are returned
    /// unchanged.
    pub fn at(self, location: Span) -> Self {
        match self {
            Term::App { functor, args, .. } => Term::App {
                functor,
                args,
                span: location,
            },
            other => other,
        }
    }

    /// The functor name of an application.
    pub fn functor(&self) -> Option<&str> {
        match self {
            Term::App { functor, .. } => Some(functor),
            _ => None,
        }
    }

    /// Arguments of an application; empty for constants.
    pub fn args(&self) -> &[Term] {
        match self {
            Term::App { args, .. } => args,
            _ => &[],
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            Term::App { span, .. } => Some(span),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Visit this term and all of its subterms, outermost first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Term)) {
        visit(self);
        for arg in self.args() {
            arg.walk(visit);
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Str(s) => write!(f, "{:?}", s),
            Term::Int(i) => write!(f, "{}", i),
            Term::Id(id) => write!(f, "{}", id),
            Term::App { functor, args, .. } => {
                write!(f, "{}(", functor)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let term = Term::app(
            "Send",
            vec![Term::id("this"), Term::str("ping"), Term::Int(3)],
        );
        assert_eq!(term.to_string(), "Send(this, \"ping\", 3)");
        assert_eq!(Term::app("NIL", vec![]).to_string(), "NIL()");
    }

    #[test]
    fn test_at_only_locates_applications() {
        let span = Span::point(None, 4, 2);
        let app = Term::app("Use", vec![Term::str("x")]).at(span.clone());
        assert_eq!(app.span(), Some(&span));
        assert_eq!(Term::Int(1).at(span).span(), None);
    }

    #[test]
    fn test_walk_visits_subterms() {
        let term = Term::app(
            "Seq",
            vec![
                Term::app("Use", vec![Term::str("x")]),
                Term::app("Use", vec![Term::str("y")]),
            ],
        );
        let mut functors = Vec::new();
        term.walk(&mut |t| {
            if let Some(f) = t.functor() {
                functors.push(f);
            }
        });
        assert_eq!(functors, vec!["Seq", "Use", "Use"]);
    }
}
