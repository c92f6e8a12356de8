use common::postgres::Migration;

/// Schema of the project replicas. Both tables are only visible through a
/// tenant connection.
pub const PROJECT_MIGRATIONS: &[Migration] = &[Migration {
    version: "0001_projects_and_memberships",
    sql: r#"
        CREATE TABLE IF NOT EXISTS projects (
            project_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            prefix TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            team_id TEXT NOT NULL DEFAULT '',
            user_id TEXT NOT NULL,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            public BOOLEAN NOT NULL DEFAULT FALSE,
            column_order TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        );
        CREATE INDEX IF NOT EXISTS projects_tenant_id_idx ON projects (tenant_id);
        ALTER TABLE projects ENABLE ROW LEVEL SECURITY;
        ALTER TABLE projects FORCE ROW LEVEL SECURITY;
        CREATE POLICY projects_tenant_isolation ON projects
            USING (tenant_id = current_setting('app.current_tenant', true))
            WITH CHECK (tenant_id = current_setting('app.current_tenant', true));

        CREATE TABLE IF NOT EXISTS memberships (
            membership_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            team_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        );
        CREATE INDEX IF NOT EXISTS memberships_tenant_id_idx ON memberships (tenant_id);
        ALTER TABLE memberships ENABLE ROW LEVEL SECURITY;
        ALTER TABLE memberships FORCE ROW LEVEL SECURITY;
        CREATE POLICY memberships_tenant_isolation ON memberships
            USING (tenant_id = current_setting('app.current_tenant', true))
            WITH CHECK (tenant_id = current_setting('app.current_tenant', true));
    "#,
}];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_forces_row_level_security() {
        for migration in PROJECT_MIGRATIONS {
            for table in ["projects", "memberships"] {
                assert!(
                    migration
                        .sql
                        .contains(&format!("ALTER TABLE {} FORCE ROW LEVEL SECURITY", table)),
                    "{table}"
                );
            }
        }
    }
}
