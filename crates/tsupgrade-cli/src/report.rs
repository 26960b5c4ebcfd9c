use tsupgrade_db::{CleanupAction, MigrationPlan, RoutineLoad, UpgradeOutcome};

pub fn render_outcome(outcome: &UpgradeOutcome) -> String {
    let mut out = String::new();
    match outcome {
        UpgradeOutcome::Upgraded(report) => {
            out.push_str(&format!(
                "Timeseries schema upgraded {} -> {}\n",
                report.from_version, report.target_version
            ));
            out.push_str("─────────────────────────\n");
            out.push_str(&format!(
                "  Routines:    {}\n",
                routine_status(&report.routines)
            ));
            out.push_str(&format!("  Steps:       {} executed\n", report.steps_executed));
            out.push_str(&format!("  Cleanup:     {} actions\n", report.cleanup_actions));
            let mode = if report.single_transaction {
                "single transaction"
            } else {
                "per statement"
            };
            out.push_str(&format!("  Commit mode: {mode}\n"));
            let elapsed = report.finished_at - report.started_at;
            out.push_str(&format!(
                "  Duration:    {} ms\n",
                elapsed.num_milliseconds()
            ));
        }
        UpgradeOutcome::PreconditionNotMet { routines } => {
            out.push_str("Timeseries schema left unchanged\n");
            out.push_str("─────────────────────────\n");
            out.push_str(&format!("  Routines:    {}\n", routine_status(routines)));
            out.push_str(
                "  The database engine is older than this upgrade supports.\n  \
                 Upgrade the engine and run the upgrade again.\n",
            );
        }
    }
    out
}

fn routine_status(load: &RoutineLoad) -> String {
    match load {
        RoutineLoad::Installed { path } => format!("loaded from {}", path.display()),
        RoutineLoad::Degraded { reason, .. } => format!("load failed ({reason})"),
    }
}

pub fn render_plan(plan: &MigrationPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Upgrade plan {} -> {}\n",
        plan.from_version, plan.target_version
    ));
    out.push_str("─────────────────────────\n");
    out.push_str(&format!("  Precondition: {}\n", plan.check_routine));
    out.push_str("  Steps:\n");
    for (i, step) in plan.steps.iter().enumerate() {
        out.push_str(&format!("    {:>2}. {}\n", i + 1, step.invocation));
    }
    out.push_str("  Cleanup:\n");
    for (i, action) in plan.cleanup.iter().enumerate() {
        let tag = match action {
            CleanupAction::DropTable(_) => "table",
            CleanupAction::DropRoutine(_) => "routine",
            CleanupAction::Execute(_) => "ddl",
        };
        out.push_str(&format!("    {:>2}. [{tag}] {}\n", i + 1, action.statement()));
    }
    out
}
