// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;

use serde::Serialize;

macro_rules! statement_kinds {
    ($($variant:ident => $keyword:literal,)*) => {
        /// Every YANG statement keyword, plus extension instances.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub enum StatementKind {
            $($variant,)*
            /// A prefixed keyword instantiating an `extension`.
            ExtensionInstance,
        }

        impl StatementKind {
            pub const ALL: &'static [StatementKind] = &[$(StatementKind::$variant,)* StatementKind::ExtensionInstance];

            /// Map a keyword as written to its kind. Prefixed keywords are
            /// extension instances; unknown plain keywords yield `None`.
            pub fn from_keyword(keyword: &str) -> Option<Self> {
                if keyword.contains(':') {
                    return Some(StatementKind::ExtensionInstance);
                }
                match keyword {
                    $($keyword => Some(StatementKind::$variant),)*
                    _ => None,
                }
            }

            pub fn keyword(&self) -> &'static str {
                match self {
                    $(StatementKind::$variant => $keyword,)*
                    StatementKind::ExtensionInstance => "<extension>",
                }
            }
        }
    };
}

statement_kinds! {
    Action => "action",
    Anydata => "anydata",
    Anyxml => "anyxml",
    Argument => "argument",
    Augment => "augment",
    Base => "base",
    BelongsTo => "belongs-to",
    Bit => "bit",
    Case => "case",
    Choice => "choice",
    Config => "config",
    Contact => "contact",
    Container => "container",
    Default => "default",
    Description => "description",
    Deviate => "deviate",
    Deviation => "deviation",
    Enum => "enum",
    ErrorAppTag => "error-app-tag",
    ErrorMessage => "error-message",
    Extension => "extension",
    Feature => "feature",
    FractionDigits => "fraction-digits",
    Grouping => "grouping",
    Identity => "identity",
    IfFeature => "if-feature",
    Import => "import",
    Include => "include",
    Input => "input",
    Key => "key",
    Leaf => "leaf",
    LeafList => "leaf-list",
    Length => "length",
    List => "list",
    Mandatory => "mandatory",
    MaxElements => "max-elements",
    MinElements => "min-elements",
    Modifier => "modifier",
    Module => "module",
    Must => "must",
    Namespace => "namespace",
    Notification => "notification",
    OrderedBy => "ordered-by",
    Organization => "organization",
    Output => "output",
    Path => "path",
    Pattern => "pattern",
    Position => "position",
    Prefix => "prefix",
    Presence => "presence",
    Range => "range",
    Reference => "reference",
    Refine => "refine",
    RequireInstance => "require-instance",
    Revision => "revision",
    RevisionDate => "revision-date",
    Rpc => "rpc",
    Status => "status",
    Submodule => "submodule",
    Type => "type",
    Typedef => "typedef",
    Unique => "unique",
    Units => "units",
    Uses => "uses",
    Value => "value",
    When => "when",
    YangVersion => "yang-version",
    YinElement => "yin-element",
}

impl StatementKind {
    /// Statements that appear in the schema tree and are addressable by a
    /// schema node identifier.
    pub fn is_schema_node(&self) -> bool {
        matches!(
            self,
            StatementKind::Container
                | StatementKind::Leaf
                | StatementKind::LeafList
                | StatementKind::List
                | StatementKind::Choice
                | StatementKind::Case
                | StatementKind::Anydata
                | StatementKind::Anyxml
                | StatementKind::Rpc
                | StatementKind::Action
                | StatementKind::Notification
                | StatementKind::Input
                | StatementKind::Output
        )
    }

    /// Schema nodes that are instantiated in data. `choice` and `case` are not.
    pub fn is_data_node(&self) -> bool {
        matches!(
            self,
            StatementKind::Container
                | StatementKind::Leaf
                | StatementKind::LeafList
                | StatementKind::List
                | StatementKind::Anydata
                | StatementKind::Anyxml
                | StatementKind::Input
                | StatementKind::Output
        )
    }

    pub fn is_root(&self) -> bool {
        matches!(self, StatementKind::Module | StatementKind::Submodule)
    }

    /// Statements with an argument that names the node itself.
    pub fn is_named_definition(&self) -> bool {
        (self.is_schema_node()
            && !matches!(self, StatementKind::Input | StatementKind::Output))
            || matches!(
                self,
                StatementKind::Feature
                    | StatementKind::Identity
                    | StatementKind::Extension
                    | StatementKind::Grouping
                    | StatementKind::Typedef
            )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
