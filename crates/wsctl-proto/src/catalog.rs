//! The WorkSpaces operation catalog.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::descriptor::{
    ConfirmImpact, OperationDescriptor, Output, Paging, ParamKind, ParamSpec,
};

const DEDICATED_TENANCY_SUPPORT: &[&str] = &["ENABLED"];
const WORKSPACE_STATE: &[&str] = &["AVAILABLE", "ADMIN_MAINTENANCE"];
const LINK_STATUS: &[&str] = &[
    "LINKED",
    "LINKING_FAILED",
    "LINK_NOT_FOUND",
    "PENDING_ACCEPTANCE_BY_TARGET_ACCOUNT",
    "REJECTED",
];
const BUNDLE_OWNER: &[&str] = &["AMAZON"];

const NEXT_TOKEN: ParamSpec = ParamSpec::new("NextToken", ParamKind::String);
const CLIENT_TOKEN: ParamSpec = ParamSpec::new("ClientToken", ParamKind::String);
const FAILED_REQUESTS: &[&str] = &["FailedRequests"];

const TERMINATE_PARAMS: &[ParamSpec] = &[ParamSpec::new("WorkspaceId", ParamKind::StringList)
    .required()
    .pipeline()
    .wrap_each("TerminateWorkspaceRequests", "WorkspaceId")];
const REBUILD_PARAMS: &[ParamSpec] = &[ParamSpec::new("WorkspaceId", ParamKind::StringList)
    .required()
    .pipeline()
    .wrap_each("RebuildWorkspaceRequests", "WorkspaceId")];
const REBOOT_PARAMS: &[ParamSpec] = &[ParamSpec::new("WorkspaceId", ParamKind::StringList)
    .required()
    .pipeline()
    .wrap_each("RebootWorkspaceRequests", "WorkspaceId")];
const START_PARAMS: &[ParamSpec] = &[ParamSpec::new("WorkspaceId", ParamKind::StringList)
    .required()
    .pipeline()
    .wrap_each("StartWorkspaceRequests", "WorkspaceId")];
const STOP_PARAMS: &[ParamSpec] = &[ParamSpec::new("WorkspaceId", ParamKind::StringList)
    .required()
    .pipeline()
    .wrap_each("StopWorkspaceRequests", "WorkspaceId")];

/// Builds a `*Workspaces` batch descriptor: one `WorkspaceId` list wrapped
/// into `{ "WorkspaceId": .. }` request objects.
const fn batch(
    name: &'static str,
    alias: &'static str,
    about: &'static str,
    params: &'static [ParamSpec],
    confirm: ConfirmImpact,
) -> OperationDescriptor {
    OperationDescriptor {
        name,
        alias,
        about,
        params,
        response_fields: FAILED_REQUESTS,
        output: Output::Field("FailedRequests"),
        paging: None,
        confirm,
        pass_thru: None,
    }
}

static OPERATIONS: &[OperationDescriptor] = &[
    // Account links
    OperationDescriptor {
        name: "AcceptAccountLinkInvitation",
        alias: "Approve-WKSAccountLinkInvitation",
        about: "Accept an account link invitation.",
        params: &[
            ParamSpec::new("LinkId", ParamKind::String).required().pipeline(),
            CLIENT_TOKEN,
        ],
        response_fields: &["AccountLink"],
        output: Output::Field("AccountLink"),
        paging: None,
        confirm: ConfirmImpact::Medium,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "RejectAccountLinkInvitation",
        alias: "Deny-WKSAccountLinkInvitation",
        about: "Reject an account link invitation.",
        params: &[
            ParamSpec::new("LinkId", ParamKind::String).required().pipeline(),
            CLIENT_TOKEN,
        ],
        response_fields: &["AccountLink"],
        output: Output::Field("AccountLink"),
        paging: None,
        confirm: ConfirmImpact::Medium,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "CreateAccountLinkInvitation",
        alias: "New-WKSAccountLinkInvitation",
        about: "Create an account link invitation for another AWS account.",
        params: &[
            ParamSpec::new("TargetAccountId", ParamKind::String)
                .required()
                .positional(0),
            CLIENT_TOKEN,
        ],
        response_fields: &["AccountLink"],
        output: Output::Field("AccountLink"),
        paging: None,
        confirm: ConfirmImpact::Medium,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "DeleteAccountLinkInvitation",
        alias: "Remove-WKSAccountLinkInvitation",
        about: "Delete an account link invitation.",
        params: &[
            ParamSpec::new("LinkId", ParamKind::String).required().pipeline(),
            CLIENT_TOKEN,
        ],
        response_fields: &["AccountLink"],
        output: Output::Field("AccountLink"),
        paging: None,
        confirm: ConfirmImpact::High,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "GetAccountLink",
        alias: "Get-WKSAccountLink",
        about: "Retrieve an account link.",
        params: &[
            ParamSpec::new("LinkId", ParamKind::String).pipeline(),
            ParamSpec::new("LinkedAccountId", ParamKind::String),
        ],
        response_fields: &["AccountLink"],
        output: Output::Field("AccountLink"),
        paging: None,
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "ListAccountLinks",
        alias: "Get-WKSAccountLinkList",
        about: "List account links.",
        params: &[
            ParamSpec::new("LinkStatusFilter", ParamKind::EnumList(LINK_STATUS)),
            ParamSpec::new("MaxResults", ParamKind::Integer),
            NEXT_TOKEN,
        ],
        response_fields: &["AccountLinks", "NextToken"],
        output: Output::Field("AccountLinks"),
        paging: Some(Paging::NEXT_TOKEN),
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
    // Account
    OperationDescriptor {
        name: "DescribeAccount",
        alias: "Get-WKSAccount",
        about: "Describe the account's BYOL configuration.",
        params: &[],
        response_fields: &[
            "DedicatedTenancySupport",
            "DedicatedTenancyManagementCidrRange",
        ],
        output: Output::Whole,
        paging: None,
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "ModifyAccount",
        alias: "Edit-WKSAccount",
        about: "Modify the account's BYOL configuration.",
        params: &[
            ParamSpec::new(
                "DedicatedTenancySupport",
                ParamKind::Enum(DEDICATED_TENANCY_SUPPORT),
            ),
            ParamSpec::new("DedicatedTenancyManagementCidrRange", ParamKind::String),
        ],
        response_fields: &[],
        output: Output::Nothing,
        paging: None,
        confirm: ConfirmImpact::Medium,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "DescribeAccountModifications",
        alias: "Get-WKSAccountModification",
        about: "List modifications made to the account's BYOL configuration.",
        params: &[NEXT_TOKEN],
        response_fields: &["AccountModifications", "NextToken"],
        output: Output::Field("AccountModifications"),
        paging: Some(Paging::NEXT_TOKEN),
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
    // Workspace lifecycle
    OperationDescriptor {
        name: "CreateWorkspaces",
        alias: "New-WKSWorkspace",
        about: "Create one or more WorkSpaces from a JSON array of WorkspaceRequest objects.",
        params: &[ParamSpec::new("Workspaces", ParamKind::Document)
            .required()
            .positional(0)],
        response_fields: &["FailedRequests", "PendingRequests"],
        output: Output::Whole,
        paging: None,
        confirm: ConfirmImpact::Medium,
        pass_thru: None,
    },
    batch(
        "TerminateWorkspaces",
        "Remove-WKSWorkspace",
        "Terminate WorkSpaces. User data is destroyed.",
        TERMINATE_PARAMS,
        ConfirmImpact::High,
    ),
    batch(
        "RebuildWorkspaces",
        "Reset-WKSWorkspace",
        "Rebuild WorkSpaces from their latest snapshot.",
        REBUILD_PARAMS,
        ConfirmImpact::High,
    ),
    batch(
        "RebootWorkspaces",
        "Restart-WKSWorkspace",
        "Reboot WorkSpaces.",
        REBOOT_PARAMS,
        ConfirmImpact::Medium,
    ),
    batch(
        "StartWorkspaces",
        "Start-WKSWorkspace",
        "Start AutoStop WorkSpaces.",
        START_PARAMS,
        ConfirmImpact::Medium,
    ),
    batch(
        "StopWorkspaces",
        "Stop-WKSWorkspace",
        "Stop AutoStop WorkSpaces.",
        STOP_PARAMS,
        ConfirmImpact::Medium,
    ),
    OperationDescriptor {
        name: "RestoreWorkspace",
        alias: "Restore-WKSWorkspace",
        about: "Restore a WorkSpace to its last known healthy state.",
        params: &[ParamSpec::new("WorkspaceId", ParamKind::String)
            .required()
            .pipeline()],
        response_fields: &[],
        output: Output::Nothing,
        paging: None,
        confirm: ConfirmImpact::High,
        pass_thru: Some("WorkspaceId"),
    },
    OperationDescriptor {
        name: "MigrateWorkspace",
        alias: "Move-WKSWorkspace",
        about: "Migrate a WorkSpace to another bundle.",
        params: &[
            ParamSpec::new("SourceWorkspaceId", ParamKind::String)
                .required()
                .positional(0),
            ParamSpec::new("BundleId", ParamKind::String)
                .required()
                .positional(1),
        ],
        response_fields: &["SourceWorkspaceId", "TargetWorkspaceId"],
        output: Output::Whole,
        paging: None,
        confirm: ConfirmImpact::High,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "ModifyWorkspaceState",
        alias: "Edit-WKSWorkspaceState",
        about: "Set a WorkSpace to AVAILABLE or ADMIN_MAINTENANCE.",
        params: &[
            ParamSpec::new("WorkspaceId", ParamKind::String)
                .required()
                .pipeline(),
            ParamSpec::new("WorkspaceState", ParamKind::Enum(WORKSPACE_STATE)).required(),
        ],
        response_fields: &[],
        output: Output::Nothing,
        paging: None,
        confirm: ConfirmImpact::Medium,
        pass_thru: Some("WorkspaceId"),
    },
    OperationDescriptor {
        name: "ModifyWorkspaceProperties",
        alias: "Edit-WKSWorkspaceProperty",
        about: "Modify the properties of a WorkSpace.",
        params: &[
            ParamSpec::new("WorkspaceId", ParamKind::String)
                .required()
                .pipeline(),
            ParamSpec::new("WorkspaceProperties", ParamKind::Document).required(),
        ],
        response_fields: &[],
        output: Output::Nothing,
        paging: None,
        confirm: ConfirmImpact::Medium,
        pass_thru: Some("WorkspaceId"),
    },
    // Describe
    OperationDescriptor {
        name: "DescribeWorkspaces",
        alias: "Get-WKSWorkspace",
        about: "Describe WorkSpaces.",
        params: &[
            ParamSpec::new("WorkspaceIds", ParamKind::StringList).pipeline(),
            ParamSpec::new("DirectoryId", ParamKind::String),
            ParamSpec::new("UserName", ParamKind::String),
            ParamSpec::new("BundleId", ParamKind::String),
            ParamSpec::new("Limit", ParamKind::Integer),
            NEXT_TOKEN,
        ],
        response_fields: &["Workspaces", "NextToken"],
        output: Output::Field("Workspaces"),
        paging: Some(Paging::NEXT_TOKEN),
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "DescribeWorkspacesConnectionStatus",
        alias: "Get-WKSWorkspacesConnectionStatus",
        about: "Describe the connection status of WorkSpaces.",
        params: &[
            ParamSpec::new("WorkspaceIds", ParamKind::StringList).pipeline(),
            NEXT_TOKEN,
        ],
        response_fields: &["WorkspacesConnectionStatus", "NextToken"],
        output: Output::Field("WorkspacesConnectionStatus"),
        paging: Some(Paging::NEXT_TOKEN),
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "DescribeWorkspaceBundles",
        alias: "Get-WKSWorkspaceBundle",
        about: "Describe WorkSpace bundles.",
        params: &[
            ParamSpec::new("BundleIds", ParamKind::StringList).positional(0),
            ParamSpec::new("Owner", ParamKind::Enum(BUNDLE_OWNER)),
            NEXT_TOKEN,
        ],
        response_fields: &["Bundles", "NextToken"],
        output: Output::Field("Bundles"),
        paging: Some(Paging::NEXT_TOKEN),
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "DescribeWorkspaceDirectories",
        alias: "Get-WKSWorkspaceDirectory",
        about: "Describe directories registered with WorkSpaces.",
        params: &[
            ParamSpec::new("DirectoryIds", ParamKind::StringList).positional(0),
            ParamSpec::new("Limit", ParamKind::Integer),
            NEXT_TOKEN,
        ],
        response_fields: &["Directories", "NextToken"],
        output: Output::Field("Directories"),
        paging: Some(Paging::NEXT_TOKEN),
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
    OperationDescriptor {
        name: "DescribeWorkspaceSnapshots",
        alias: "Get-WKSWorkspaceSnapshot",
        about: "Describe the rebuild and restore snapshots of a WorkSpace.",
        params: &[ParamSpec::new("WorkspaceId", ParamKind::String)
            .required()
            .pipeline()],
        response_fields: &["RebuildSnapshots", "RestoreSnapshots"],
        output: Output::Whole,
        paging: None,
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
    // Tags
    OperationDescriptor {
        name: "CreateTags",
        alias: "New-WKSTag",
        about: "Add tags (JSON array of {Key, Value}) to a WorkSpaces resource.",
        params: &[
            ParamSpec::new("ResourceId", ParamKind::String)
                .required()
                .positional(0),
            ParamSpec::new("Tags", ParamKind::Document).required(),
        ],
        response_fields: &[],
        output: Output::Nothing,
        paging: None,
        confirm: ConfirmImpact::Medium,
        pass_thru: Some("ResourceId"),
    },
    OperationDescriptor {
        name: "DeleteTags",
        alias: "Remove-WKSTag",
        about: "Remove tags from a WorkSpaces resource.",
        params: &[
            ParamSpec::new("ResourceId", ParamKind::String)
                .required()
                .positional(0),
            ParamSpec::new("TagKeys", ParamKind::StringList).required(),
        ],
        response_fields: &[],
        output: Output::Nothing,
        paging: None,
        confirm: ConfirmImpact::High,
        pass_thru: Some("ResourceId"),
    },
    OperationDescriptor {
        name: "DescribeTags",
        alias: "Get-WKSTag",
        about: "Describe the tags of a WorkSpaces resource.",
        params: &[ParamSpec::new("ResourceId", ParamKind::String)
            .required()
            .pipeline()],
        response_fields: &["TagList"],
        output: Output::Field("TagList"),
        paging: None,
        confirm: ConfirmImpact::None,
        pass_thru: None,
    },
];

/// Lower-cased subcommand name, alias and API name -> catalog index.
static INDEX: Lazy<HashMap<String, usize>> = Lazy::new(|| {
    let mut index = HashMap::with_capacity(OPERATIONS.len() * 3);
    for (i, op) in OPERATIONS.iter().enumerate() {
        index.insert(op.command_name(), i);
        index.insert(op.alias.to_ascii_lowercase(), i);
        index.insert(op.name.to_ascii_lowercase(), i);
    }
    index
});

/// Every operation, in catalog order.
#[must_use]
pub fn operations() -> &'static [OperationDescriptor] {
    OPERATIONS
}

/// Find an operation by subcommand name, alias or API name (case-insensitive).
#[must_use]
pub fn find_operation(name: &str) -> Option<&'static OperationDescriptor> {
    INDEX
        .get(&name.to_ascii_lowercase())
        .map(|&i| &OPERATIONS[i])
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::descriptor::ParamSource;

    #[test]
    fn names_are_unique() {
        let mut seen = HashSet::new();
        for op in operations() {
            assert!(seen.insert(op.command_name()), "duplicate {}", op.name);
            assert!(seen.insert(op.alias.to_ascii_lowercase()), "duplicate {}", op.alias);
        }
    }

    #[test]
    fn default_field_is_documented() {
        for op in operations() {
            if let Output::Field(field) = op.output {
                assert!(
                    op.response_fields.contains(&field),
                    "{} defaults to undocumented field {field}",
                    op.name
                );
            }
        }
    }

    #[test]
    fn whole_response_only_for_multi_field_results() {
        let mut whole: Vec<&str> = operations()
            .iter()
            .filter(|op| op.output == Output::Whole)
            .map(|op| op.name)
            .collect();
        whole.sort_unstable();
        assert_eq!(
            whole,
            vec![
                "CreateWorkspaces",
                "DescribeAccount",
                "DescribeWorkspaceSnapshots",
                "MigrateWorkspace",
            ]
        );
    }

    #[test]
    fn paged_operations_declare_their_token() {
        for op in operations() {
            if let Some(paging) = op.paging {
                assert!(op.param(paging.input_token).is_some(), "{}", op.name);
                assert!(op.response_field(paging.output_token).is_some(), "{}", op.name);
            }
        }
    }

    #[test]
    fn pass_thru_names_a_parameter() {
        for op in operations() {
            if let Some(param) = op.pass_thru {
                assert!(op.param(param).is_some(), "{}", op.name);
            }
        }
    }

    #[test]
    fn at_most_one_param_per_position() {
        for op in operations() {
            let mut positions = HashSet::new();
            for spec in op.params {
                if let Some(pos) = spec.position() {
                    assert!(positions.insert(pos), "{} reuses position {pos}", op.name);
                }
            }
            let pipelines = op
                .params
                .iter()
                .filter(|spec| spec.source == ParamSource::Pipeline)
                .count();
            assert!(pipelines <= 1, "{}", op.name);
        }
    }

    #[test]
    fn find_by_any_name() {
        let by_command = find_operation("reject-account-link-invitation").expect("command");
        let by_alias = find_operation("Deny-WKSAccountLinkInvitation").expect("alias");
        let by_api = find_operation("RejectAccountLinkInvitation").expect("api");
        assert_eq!(by_command.name, "RejectAccountLinkInvitation");
        assert_eq!(by_alias, by_command);
        assert_eq!(by_api, by_command);
        assert!(find_operation("describe-nothing").is_none());
    }

    #[test]
    fn read_only_operations_never_prompt() {
        let op = find_operation("DescribeWorkspaces").expect("op");
        assert!(!op.is_mutating());
        let op = find_operation("TerminateWorkspaces").expect("op");
        assert_eq!(op.confirm, ConfirmImpact::High);
    }
}
