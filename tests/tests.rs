// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod lexer;
mod parser;
mod reactor;
