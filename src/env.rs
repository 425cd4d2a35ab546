// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Ast, CheckedAst};
use crate::builtins;
use crate::checker::{Checker, CheckerOptions};
use crate::container::{Container, ContainerError};
use crate::cost::{self, CostEstimate, CostEstimator, CostOptions};
use crate::decls::{DeclError, Declarations, EnumDecl, FunctionDecl};
use crate::interpreter::{EvalOptions, Program};
use crate::issues::Issues;
use crate::parser::{parse_with_options, ParserOptions};
use crate::provider::TypeProvider;
use crate::types::Type;
use crate::value::EvalError;
use crate::Rc;

use log::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvError {
    #[error(transparent)]
    Declaration(#[from] DeclError),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Everything needed to turn expression text into runnable programs:
/// declarations, the container names resolve against, an optional message
/// type provider, and options for each stage.
///
/// An `Env` is immutable once built; the `with_*` methods return an
/// extended copy and leave the original untouched.
#[derive(Debug, Clone)]
pub struct Env {
    decls: Rc<Declarations>,
    container: Container,
    provider: Option<Rc<dyn TypeProvider>>,
    parser_options: ParserOptions,
    checker_options: CheckerOptions,
    eval_options: EvalOptions,
    cost_options: CostOptions,
}

impl Env {
    /// An environment with the standard library and no variables.
    pub fn standard() -> Result<Env, EnvError> {
        Ok(Self::with_declarations(builtins::standard()?))
    }

    /// An environment over caller supplied declarations only.
    pub fn with_declarations(decls: Rc<Declarations>) -> Env {
        Env {
            decls,
            container: Container::default(),
            provider: None,
            parser_options: ParserOptions::default(),
            checker_options: CheckerOptions::default(),
            eval_options: EvalOptions::default(),
            cost_options: CostOptions::default(),
        }
    }

    pub fn declarations(&self) -> &Declarations {
        &self.decls
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn checker_options(&self) -> &CheckerOptions {
        &self.checker_options
    }

    fn extended(
        &self,
        f: impl FnOnce(&mut Declarations) -> Result<(), DeclError>,
    ) -> Result<Env, EnvError> {
        let mut decls = Declarations::extend(self.decls.clone());
        f(&mut decls)?;
        Ok(Env {
            decls: Rc::new(decls),
            ..self.clone()
        })
    }

    pub fn with_variable(&self, name: &str, ty: Type) -> Result<Env, EnvError> {
        self.extended(|d| d.add_variable(name, ty))
    }

    pub fn with_function(&self, decl: FunctionDecl) -> Result<Env, EnvError> {
        self.extended(|d| d.add_function(decl))
    }

    pub fn with_enum(&self, decl: EnumDecl) -> Result<Env, EnvError> {
        self.extended(|d| {
            d.add_enum(decl);
            Ok(())
        })
    }

    pub fn with_container(&self, name: &str) -> Result<Env, EnvError> {
        Ok(Env {
            container: Container::new(name)?,
            ..self.clone()
        })
    }

    pub fn with_alias(&self, alias: &str, qualified: &str) -> Result<Env, EnvError> {
        Ok(Env {
            container: self.container.with_alias(alias, qualified)?,
            ..self.clone()
        })
    }

    pub fn with_abbreviation(&self, qualified: &str) -> Result<Env, EnvError> {
        Ok(Env {
            container: self.container.with_abbreviation(qualified)?,
            ..self.clone()
        })
    }

    pub fn with_type_provider(&self, provider: Rc<dyn TypeProvider>) -> Env {
        Env {
            provider: Some(provider),
            ..self.clone()
        }
    }

    pub fn with_parser_options(&self, options: ParserOptions) -> Env {
        Env {
            parser_options: options,
            ..self.clone()
        }
    }

    pub fn with_checker_options(&self, options: CheckerOptions) -> Env {
        Env {
            checker_options: options,
            ..self.clone()
        }
    }

    pub fn with_eval_options(&self, options: EvalOptions) -> Env {
        Env {
            eval_options: options,
            ..self.clone()
        }
    }

    pub fn with_cost_options(&self, options: CostOptions) -> Env {
        Env {
            cost_options: options,
            ..self.clone()
        }
    }

    pub fn parse(&self, text: &str) -> Result<Ast, Issues> {
        parse_with_options(text, &self.parser_options)
    }

    pub fn check(&self, ast: &Ast) -> Result<CheckedAst, Issues> {
        Checker::new(
            &self.decls,
            &self.container,
            self.provider.as_deref(),
            &self.checker_options,
            &ast.source_info,
        )
        .check(ast)
    }

    /// Parses and checks `text`.
    pub fn compile(&self, text: &str) -> Result<CheckedAst, Issues> {
        let ast = self.parse(text)?;
        self.check(&ast)
    }

    pub fn program(&self, ast: CheckedAst) -> Result<Program, EvalError> {
        debug!("building program for `{}`", ast.ast.source.contents());
        Program::new(
            ast,
            self.decls.clone(),
            self.provider.clone(),
            self.eval_options.clone(),
        )
    }

    pub fn estimate_cost(&self, ast: &CheckedAst, estimator: &dyn CostEstimator) -> CostEstimate {
        cost::estimate_cost(ast, estimator, &self.cost_options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::MapActivation;
    use crate::value::Value;

    #[test]
    fn extension_leaves_the_original_untouched() {
        let base = Env::standard().unwrap();
        let env = base.with_variable("a", Type::Int).unwrap();
        assert!(env.compile("a == 1").is_ok());
        assert!(base.compile("a == 1").is_err());
    }

    #[test]
    fn compile_and_run() {
        let env = Env::standard()
            .unwrap()
            .with_variable("a", Type::Int)
            .unwrap();
        let program = env.program(env.compile("a == 1").unwrap()).unwrap();
        let (v, _) = program.eval(&MapActivation::new().bind("a", 1));
        assert_eq!(v, Value::Bool(true));
    }

    #[test]
    fn enums_and_containers() {
        let env = Env::standard()
            .unwrap()
            .with_enum(EnumDecl::new("pkg.Color", &[("RED", 1), ("BLUE", 2)]))
            .unwrap()
            .with_container("pkg")
            .unwrap();
        let program = env.program(env.compile("Color.BLUE == 2").unwrap()).unwrap();
        assert_eq!(program.eval_bool(&MapActivation::new()), Ok(true));
    }

    #[test]
    fn conflicting_variables() {
        let env = Env::standard()
            .unwrap()
            .with_variable("a", Type::Int)
            .unwrap();
        assert!(matches!(
            env.with_variable("a", Type::String),
            Err(EnvError::Declaration(DeclError::DuplicateVariable(_)))
        ));
        assert!(env.with_alias("a.b", "x.y").is_err());
    }
}
