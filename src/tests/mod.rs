// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod checker;
mod common;
mod interpreter;
