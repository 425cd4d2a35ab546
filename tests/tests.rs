// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod cost;
mod env;
mod lexer;
mod parser;
mod policy;
mod proto;
mod value;
