mod resolver_and_sweeper_flows;
