//! Checked invocation of registered functions.
use crate::{registry::Registry, types::*, value::Value};
use tracing::instrument;

/// Validates arguments against a function's signature and invokes it.
///
/// The evaluator borrows the registry and holds no other state, so it is cheap to create one
/// per call. Every function call made from SQL goes through [Evaluator::evaluate].
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'r> {
    registry: &'r Registry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Evaluator { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Call the function `name` with `args`.
    ///
    /// Checks happen in this order, and the first one to fail is reported:
    /// - the function exists ([Error::NotFound]),
    /// - the number of arguments matches ([Error::Arity]),
    /// - each argument's type is accepted by the declared kind ([Error::TypeMismatch]; the
    ///   position is 1-based and NULL is never accepted).
    ///
    /// If the implementation fails, or returns a value its declared return kind does not
    /// accept, the failure is reported as [Error::Evaluation] with the cause as its source.
    #[instrument(name = "eval::evaluate", level = "trace", skip(self, args), fields(argc = args.len()))]
    pub fn evaluate(&self, name: &str, args: &[Value]) -> Result<Value> {
        let func = self.registry.lookup(name)?;
        let sig = func.signature();
        if args.len() != sig.arity() {
            return Err(Error::Arity {
                name: sig.name().to_owned(),
                expected: sig.arity(),
                actual: args.len(),
            });
        }
        for (i, (kind, arg)) in sig.params().iter().zip(args).enumerate() {
            if !kind.accepts(arg.value_type()) {
                return Err(Error::TypeMismatch {
                    name: sig.name().to_owned(),
                    position: i + 1,
                    expected: *kind,
                    actual: arg.value_type(),
                });
            }
        }
        let wrap = |source: Error| Error::Evaluation {
            name: sig.name().to_owned(),
            source: Box::new(source),
        };
        let ret = func.call(args).map_err(wrap)?;
        if !sig.returns().accepts(ret.value_type()) {
            return Err(wrap(Error::invalid_input(format!(
                "returned {} but is declared to return {}",
                ret.value_type(),
                sig.returns()
            ))));
        }
        Ok(ret)
    }
}

impl Registry {
    /// Shorthand for [Evaluator::new].
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::function::*;
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        let mut r = Registry::new();
        r.register(
            FunctionSignature::new("add", [Kind::Integer, Kind::Number], Kind::Number),
            |args: &[Value]| match (&args[0], &args[1]) {
                (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
                (a, b) => Ok(Value::Float(a.as_f64()? + b.as_f64()?)),
            },
        )
        .unwrap();
        r.register(
            FunctionSignature::new("fail", [], Kind::Text),
            |_: &[Value]| Err(Error::invalid_input("always fails")),
        )
        .unwrap();
        r.register(
            FunctionSignature::new("liar", [], Kind::Text),
            |_: &[Value]| Ok(Value::Integer(1)),
        )
        .unwrap();
        r
    }

    #[test]
    fn evaluate() -> Result<()> {
        let r = registry();
        let e = r.evaluator();
        let args = [Value::Integer(2), Value::Float(0.5)];
        assert_eq!(e.evaluate("add", &args)?, Value::Float(2.5));
        // Pure functions give the same answer every time.
        assert_eq!(e.evaluate("add", &args)?, e.evaluate("ADD", &args)?);
        Ok(())
    }

    #[test]
    fn not_found() {
        let r = registry();
        let ret = r.evaluator().evaluate("missing", &[]);
        assert!(matches!(ret, Err(Error::NotFound(_))), "{:?}", ret);
    }

    #[test]
    fn arity() {
        let r = registry();
        let ret = r.evaluator().evaluate("add", &[Value::Integer(1)]);
        match ret {
            Err(Error::Arity {
                name,
                expected,
                actual,
            }) => {
                assert_eq!(name, "add");
                assert_eq!((expected, actual), (2, 1));
            }
            x => panic!("expected Arity, got {:?}", x),
        }
    }

    #[test]
    fn type_mismatch() {
        let r = registry();
        let ret = r
            .evaluator()
            .evaluate("add", &[Value::Integer(1), Value::from("2")]);
        match ret {
            Err(Error::TypeMismatch {
                position,
                expected,
                actual,
                ..
            }) => {
                assert_eq!(position, 2);
                assert_eq!(expected, Kind::Number);
                assert_eq!(actual, crate::ValueType::Text);
            }
            x => panic!("expected TypeMismatch, got {:?}", x),
        }
    }

    #[test]
    fn null_is_rejected() {
        let r = registry();
        let ret = r
            .evaluator()
            .evaluate("add", &[Value::Null, Value::Integer(1)]);
        assert!(
            matches!(ret, Err(Error::TypeMismatch { position: 1, .. })),
            "{:?}",
            ret
        );
    }

    #[test]
    fn failure_is_wrapped() {
        let r = registry();
        match r.evaluator().evaluate("fail", &[]) {
            Err(Error::Evaluation { name, source }) => {
                assert_eq!(name, "fail");
                assert!(matches!(*source, Error::InvalidInput(ref m) if m == "always fails"));
            }
            x => panic!("expected Evaluation, got {:?}", x),
        }
    }

    #[test]
    fn wrong_return_type() {
        let r = registry();
        let ret = r.evaluator().evaluate("liar", &[]);
        assert!(matches!(ret, Err(Error::Evaluation { .. })), "{:?}", ret);
    }
}
